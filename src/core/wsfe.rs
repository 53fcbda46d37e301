use crate::core::soap::{self, format_afip_date, parse_afip_date, XmlWriter};
use crate::domain::model::{
    AuthorizationResult, CaeResult, Credentials, DocType, InvoiceDetail, LastVoucher, ParamItem,
    ServerStatus, VoucherRecord, VoucherType,
};
use crate::domain::ports::SoapTransport;
use crate::utils::error::{AfipError, Result};
use roxmltree::Node;
use rust_decimal::Decimal;
use std::sync::Arc;

pub const WSFE_NAMESPACE: &str = "http://ar.gov.afip.dif.FEV1/";
const SERVICE: &str = "wsfe";

/// WSFEv1 電子發票服務用戶端
pub struct WsfeClient {
    transport: Arc<dyn SoapTransport>,
    url: String,
}

impl WsfeClient {
    pub fn new(transport: Arc<dyn SoapTransport>, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }

    /// Health check of the three WSFE back ends; needs no ticket.
    pub async fn dummy(&self) -> Result<ServerStatus> {
        let body = self.invoke("FEDummy", |_| {}).await?;
        let doc = soap::parse_response(&body)?;
        let result = soap::find_required(doc.root(), "FEDummyResult")?;

        Ok(ServerStatus {
            app_server: soap::text_of(result, "AppServer").unwrap_or_default(),
            db_server: soap::text_of(result, "DbServer").unwrap_or_default(),
            auth_server: soap::text_of(result, "AuthServer").unwrap_or_default(),
        })
    }

    pub async fn last_authorized(
        &self,
        auth: &Credentials,
        point_of_sale: u32,
        voucher_type: VoucherType,
    ) -> Result<LastVoucher> {
        let body = self
            .invoke("FECompUltimoAutorizado", |w| {
                write_auth(w, auth);
                w.leaf("ar:PtoVta", point_of_sale)
                    .leaf("ar:CbteTipo", voucher_type.code());
            })
            .await?;
        let doc = soap::parse_response(&body)?;
        let result = soap::find_required(doc.root(), "FECompUltimoAutorizadoResult")?;
        check_errors(result)?;

        // Without any authorized voucher AFIP omits or zeroes CbteNro.
        let number = soap::parse_of::<u64>(result, "CbteNro")?.unwrap_or(0);
        tracing::debug!(
            "Last authorized voucher for {:04}/{}: {}",
            point_of_sale,
            voucher_type.code(),
            number
        );

        Ok(LastVoucher {
            point_of_sale,
            voucher_type,
            number,
        })
    }

    /// `FECAESolicitar` for a single voucher (CantReg = 1).
    pub async fn request_cae(
        &self,
        auth: &Credentials,
        point_of_sale: u32,
        voucher_type: VoucherType,
        detail: &InvoiceDetail,
    ) -> Result<CaeResult> {
        let body = self
            .invoke("FECAESolicitar", |w| {
                write_auth(w, auth);
                w.open("ar:FeCAEReq")
                    .open("ar:FeCabReq")
                    .leaf("ar:CantReg", 1)
                    .leaf("ar:PtoVta", point_of_sale)
                    .leaf("ar:CbteTipo", voucher_type.code())
                    .close("ar:FeCabReq")
                    .open("ar:FeDetReq");
                write_detail(w, detail);
                w.close("ar:FeDetReq").close("ar:FeCAEReq");
            })
            .await?;

        let doc = soap::parse_response(&body)?;
        let result = soap::find_required(doc.root(), "FECAESolicitarResult")?;
        parse_cae_result(result, point_of_sale, voucher_type, detail.number_from)
    }

    pub async fn vat_types(&self, auth: &Credentials) -> Result<Vec<ParamItem>> {
        self.param_table(auth, "FEParamGetTiposIva", "IvaTipo").await
    }

    pub async fn voucher_types(&self, auth: &Credentials) -> Result<Vec<ParamItem>> {
        self.param_table(auth, "FEParamGetTiposCbte", "CbteTipo").await
    }

    pub async fn query_voucher(
        &self,
        auth: &Credentials,
        point_of_sale: u32,
        voucher_type: VoucherType,
        number: u64,
    ) -> Result<VoucherRecord> {
        let body = self
            .invoke("FECompConsultar", |w| {
                write_auth(w, auth);
                w.open("ar:FeCompConsReq")
                    .leaf("ar:CbteTipo", voucher_type.code())
                    .leaf("ar:CbteNro", number)
                    .leaf("ar:PtoVta", point_of_sale)
                    .close("ar:FeCompConsReq");
            })
            .await?;
        let doc = soap::parse_response(&body)?;
        let result = soap::find_required(doc.root(), "FECompConsultarResult")?;
        check_errors(result)?;
        let get = soap::find_required(result, "ResultGet")?;

        Ok(VoucherRecord {
            point_of_sale,
            voucher_type,
            number,
            date: soap::text_of(get, "CbteFch").and_then(|d| parse_afip_date(&d)),
            doc_type: soap::parse_of::<u16>(get, "DocTipo")?.map(DocType::from),
            doc_number: soap::parse_of(get, "DocNro")?,
            total: soap::parse_of::<Decimal>(get, "ImpTotal")?,
            authorization_code: soap::text_of(get, "CodAutorizacion"),
            authorization_due: soap::text_of(get, "FchVto").and_then(|d| parse_afip_date(&d)),
            result: soap::text_of(get, "Resultado")
                .and_then(|r| AuthorizationResult::from_code(&r)),
        })
    }

    async fn param_table(
        &self,
        auth: &Credentials,
        operation: &str,
        row: &str,
    ) -> Result<Vec<ParamItem>> {
        let body = self.invoke(operation, |w| write_auth(w, auth)).await?;
        let doc = soap::parse_response(&body)?;
        let result = soap::find_required(doc.root(), &format!("{}Result", operation))?;
        check_errors(result)?;

        let Some(rows) = soap::find(result, "ResultGet") else {
            return Ok(Vec::new());
        };
        Ok(soap::children(rows, row)
            .map(|item| ParamItem {
                id: soap::text_of(item, "Id").unwrap_or_default(),
                description: soap::text_of(item, "Desc").unwrap_or_default(),
                valid_from: soap::text_of(item, "FchDesde").and_then(|d| parse_afip_date(&d)),
                valid_to: soap::text_of(item, "FchHasta").and_then(|d| parse_afip_date(&d)),
            })
            .collect())
    }

    async fn invoke<F>(&self, operation: &str, write_body: F) -> Result<String>
    where
        F: FnOnce(&mut XmlWriter),
    {
        let tag = format!("ar:{}", operation);
        let mut w = XmlWriter::new();
        w.open(&tag);
        write_body(&mut w);
        w.close(&tag);

        let envelope = soap::envelope("ar", WSFE_NAMESPACE, &w.finish());
        let action = format!("{}{}", WSFE_NAMESPACE, operation);
        self.transport.call(&self.url, &action, envelope).await
    }
}

fn write_auth(w: &mut XmlWriter, auth: &Credentials) {
    w.open("ar:Auth")
        .leaf("ar:Token", &auth.token)
        .leaf("ar:Sign", &auth.sign)
        .leaf("ar:Cuit", auth.cuit)
        .close("ar:Auth");
}

fn money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

/// Elements follow the order of `FECAEDetRequest` in the WSDL.
fn write_detail(w: &mut XmlWriter, d: &InvoiceDetail) {
    w.open("ar:FECAEDetRequest")
        .leaf("ar:Concepto", d.concept.code())
        .leaf("ar:DocTipo", d.doc_type.code())
        .leaf("ar:DocNro", d.doc_number)
        .leaf("ar:CbteDesde", d.number_from)
        .leaf("ar:CbteHasta", d.number_to)
        .leaf("ar:CbteFch", format_afip_date(d.date))
        .leaf("ar:ImpTotal", money(d.total))
        .leaf("ar:ImpTotConc", money(d.untaxed))
        .leaf("ar:ImpNeto", money(d.net))
        .leaf("ar:ImpOpEx", money(d.exempt))
        .leaf("ar:ImpTrib", money(d.taxes))
        .leaf("ar:ImpIVA", money(d.vat));

    if d.concept.requires_service_dates() {
        w.leaf_opt("ar:FchServDesde", d.service_from.map(format_afip_date))
            .leaf_opt("ar:FchServHasta", d.service_to.map(format_afip_date))
            .leaf_opt("ar:FchVtoPago", d.payment_due.map(format_afip_date));
    }

    w.leaf("ar:MonId", &d.currency)
        .leaf("ar:MonCotiz", format!("{:.3}", d.exchange_rate))
        .leaf("ar:CondicionIVAReceptorId", d.receiver_vat_condition);

    if !d.vat_lines.is_empty() {
        w.open("ar:Iva");
        for line in &d.vat_lines {
            w.open("ar:AlicIva")
                .leaf("ar:Id", line.rate.id())
                .leaf("ar:BaseImp", money(line.base))
                .leaf("ar:Importe", money(line.amount))
                .close("ar:AlicIva");
        }
        w.close("ar:Iva");
    }

    w.close("ar:FECAEDetRequest");
}

fn check_errors(result: Node<'_, '_>) -> Result<()> {
    let errors = soap::collect_messages(result, "Errors", "Err", "Code", "Msg");
    if errors.is_empty() {
        return Ok(());
    }
    Err(AfipError::ServiceError {
        service: SERVICE.to_string(),
        errors,
    })
}

fn parse_cae_result(
    result: Node<'_, '_>,
    point_of_sale: u32,
    voucher_type: VoucherType,
    number: u64,
) -> Result<CaeResult> {
    let errors = soap::collect_messages(result, "Errors", "Err", "Code", "Msg");
    let events = soap::collect_messages(result, "Events", "Evt", "Code", "Msg");

    // A request rejected as a whole carries only <Errors>.
    let Some(header) = soap::find(result, "FeCabResp") else {
        return Err(AfipError::ServiceError {
            service: SERVICE.to_string(),
            errors,
        });
    };
    let detail = soap::find(result, "FECAEDetResponse");

    let code = detail
        .and_then(|d| soap::text_of(d, "Resultado"))
        .or_else(|| soap::text_of(header, "Resultado"))
        .ok_or_else(|| AfipError::malformed("FECAESolicitar response has no <Resultado>"))?;
    let outcome = AuthorizationResult::from_code(&code)
        .ok_or_else(|| AfipError::malformed(format!("unknown result code '{}'", code)))?;

    let (cae, cae_due_date, observations, number) = match detail {
        Some(d) => (
            soap::text_of(d, "CAE"),
            soap::text_of(d, "CAEFchVto").and_then(|v| parse_afip_date(&v)),
            soap::collect_messages(d, "Observaciones", "Obs", "Code", "Msg"),
            soap::parse_of::<u64>(d, "CbteDesde")?.unwrap_or(number),
        ),
        None => (None, None, Vec::new(), number),
    };

    Ok(CaeResult {
        result: outcome,
        point_of_sale,
        voucher_type,
        number,
        cae,
        cae_due_date,
        observations,
        events,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::ScriptedTransport;
    use crate::domain::model::{Concept, VatLine, VatRate};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn auth() -> Credentials {
        Credentials {
            token: "TOKEN".to_string(),
            sign: "SIGN".to_string(),
            cuit: 20431255570,
        }
    }

    fn wrap(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?><soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body>{}</soap:Body></soap:Envelope>"#,
            body
        )
    }

    fn detail() -> InvoiceDetail {
        InvoiceDetail {
            concept: Concept::Products,
            doc_type: DocType::Cuit,
            doc_number: 20111111112,
            number_from: 43,
            number_to: 43,
            date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            total: dec!(121),
            untaxed: Decimal::ZERO,
            net: dec!(100),
            exempt: Decimal::ZERO,
            taxes: Decimal::ZERO,
            vat: dec!(21),
            service_from: None,
            service_to: None,
            payment_due: None,
            currency: "PES".to_string(),
            exchange_rate: Decimal::ONE,
            receiver_vat_condition: 1,
            vat_lines: vec![VatLine {
                rate: VatRate::TwentyOne,
                base: dec!(100),
                amount: dec!(21),
            }],
        }
    }

    fn client(transport: &Arc<ScriptedTransport>) -> WsfeClient {
        WsfeClient::new(transport.clone(), "https://wsfe.test/service.asmx")
    }

    #[tokio::test]
    async fn test_dummy() {
        let transport = Arc::new(ScriptedTransport::new().reply(wrap(
            r#"<FEDummyResponse xmlns="http://ar.gov.afip.dif.FEV1/"><FEDummyResult><AppServer>OK</AppServer><DbServer>OK</DbServer><AuthServer>OK</AuthServer></FEDummyResult></FEDummyResponse>"#,
        )));

        let status = client(&transport).dummy().await.unwrap();

        assert!(status.is_healthy());
        let calls = transport.calls();
        assert_eq!(calls[0].action, "http://ar.gov.afip.dif.FEV1/FEDummy");
        assert!(!calls[0].envelope.contains("ar:Auth"));
    }

    #[tokio::test]
    async fn test_last_authorized() {
        let transport = Arc::new(ScriptedTransport::new().reply(wrap(
            r#"<FECompUltimoAutorizadoResponse xmlns="http://ar.gov.afip.dif.FEV1/"><FECompUltimoAutorizadoResult><PtoVta>1</PtoVta><CbteTipo>6</CbteTipo><CbteNro>42</CbteNro></FECompUltimoAutorizadoResult></FECompUltimoAutorizadoResponse>"#,
        )));

        let last = client(&transport)
            .last_authorized(&auth(), 1, VoucherType::FacturaB)
            .await
            .unwrap();

        assert_eq!(last.number, 42);
        let envelope = &transport.calls()[0].envelope;
        assert!(envelope.contains(
            "<ar:Auth><ar:Token>TOKEN</ar:Token><ar:Sign>SIGN</ar:Sign><ar:Cuit>20431255570</ar:Cuit></ar:Auth>"
        ));
        assert!(envelope.contains("<ar:PtoVta>1</ar:PtoVta><ar:CbteTipo>6</ar:CbteTipo>"));
    }

    #[tokio::test]
    async fn test_last_authorized_without_vouchers_is_zero() {
        let transport = Arc::new(ScriptedTransport::new().reply(wrap(
            r#"<FECompUltimoAutorizadoResponse xmlns="http://ar.gov.afip.dif.FEV1/"><FECompUltimoAutorizadoResult><PtoVta>3</PtoVta><CbteTipo>11</CbteTipo></FECompUltimoAutorizadoResult></FECompUltimoAutorizadoResponse>"#,
        )));

        let last = client(&transport)
            .last_authorized(&auth(), 3, VoucherType::FacturaC)
            .await
            .unwrap();
        assert_eq!(last.number, 0);
    }

    #[tokio::test]
    async fn test_errors_block_is_an_error() {
        let transport = Arc::new(ScriptedTransport::new().reply(wrap(
            r#"<FECompUltimoAutorizadoResponse xmlns="http://ar.gov.afip.dif.FEV1/"><FECompUltimoAutorizadoResult><PtoVta>1</PtoVta><CbteTipo>6</CbteTipo><CbteNro>0</CbteNro><Errors><Err><Code>600</Code><Msg>ValidacionDeToken: No validaron las credenciales</Msg></Err></Errors></FECompUltimoAutorizadoResult></FECompUltimoAutorizadoResponse>"#,
        )));

        let err = client(&transport)
            .last_authorized(&auth(), 1, VoucherType::FacturaB)
            .await
            .unwrap_err();

        match err {
            AfipError::ServiceError { service, errors } => {
                assert_eq!(service, "wsfe");
                assert_eq!(errors[0].code, "600");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_request_cae_approved() {
        let transport = Arc::new(ScriptedTransport::new().reply(wrap(
            r#"<FECAESolicitarResponse xmlns="http://ar.gov.afip.dif.FEV1/"><FECAESolicitarResult>
                <FeCabResp><Cuit>20431255570</Cuit><PtoVta>1</PtoVta><CbteTipo>1</CbteTipo><FchProceso>20250630120000</FchProceso><CantReg>1</CantReg><Resultado>A</Resultado><Reproceso>N</Reproceso></FeCabResp>
                <FeDetResp><FECAEDetResponse><Concepto>1</Concepto><DocTipo>80</DocTipo><DocNro>20111111112</DocNro><CbteDesde>43</CbteDesde><CbteHasta>43</CbteHasta><CbteFch>20250630</CbteFch><Resultado>A</Resultado>
                <Observaciones><Obs><Code>10217</Code><Msg>El credito fiscal discriminado no podra computarse</Msg></Obs></Observaciones>
                <CAE>75261234567890</CAE><CAEFchVto>20250710</CAEFchVto></FECAEDetResponse></FeDetResp>
            </FECAESolicitarResult></FECAESolicitarResponse>"#,
        )));

        let result = client(&transport)
            .request_cae(&auth(), 1, VoucherType::FacturaA, &detail())
            .await
            .unwrap();

        assert!(result.is_approved());
        assert_eq!(result.number, 43);
        assert_eq!(result.cae.as_deref(), Some("75261234567890"));
        assert_eq!(result.cae_due_date, NaiveDate::from_ymd_opt(2025, 7, 10));
        assert_eq!(result.observations.len(), 1);
        assert_eq!(result.observations[0].code, "10217");
    }

    #[tokio::test]
    async fn test_request_cae_detail_xml() {
        let transport = Arc::new(ScriptedTransport::new().reply(wrap(
            r#"<FECAESolicitarResponse xmlns="http://ar.gov.afip.dif.FEV1/"><FECAESolicitarResult><FeCabResp><Resultado>A</Resultado></FeCabResp><FeDetResp><FECAEDetResponse><CbteDesde>43</CbteDesde><Resultado>A</Resultado><CAE>1</CAE><CAEFchVto>20250710</CAEFchVto></FECAEDetResponse></FeDetResp></FECAESolicitarResult></FECAESolicitarResponse>"#,
        )));

        client(&transport)
            .request_cae(&auth(), 1, VoucherType::FacturaA, &detail())
            .await
            .unwrap();

        let envelope = &transport.calls()[0].envelope;
        assert!(envelope.contains(
            "<ar:FeCabReq><ar:CantReg>1</ar:CantReg><ar:PtoVta>1</ar:PtoVta><ar:CbteTipo>1</ar:CbteTipo></ar:FeCabReq>"
        ));
        assert!(envelope.contains(concat!(
            "<ar:Concepto>1</ar:Concepto><ar:DocTipo>80</ar:DocTipo><ar:DocNro>20111111112</ar:DocNro>",
            "<ar:CbteDesde>43</ar:CbteDesde><ar:CbteHasta>43</ar:CbteHasta><ar:CbteFch>20250630</ar:CbteFch>",
            "<ar:ImpTotal>121.00</ar:ImpTotal><ar:ImpTotConc>0.00</ar:ImpTotConc><ar:ImpNeto>100.00</ar:ImpNeto>",
            "<ar:ImpOpEx>0.00</ar:ImpOpEx><ar:ImpTrib>0.00</ar:ImpTrib><ar:ImpIVA>21.00</ar:ImpIVA>",
            "<ar:MonId>PES</ar:MonId><ar:MonCotiz>1.000</ar:MonCotiz><ar:CondicionIVAReceptorId>1</ar:CondicionIVAReceptorId>",
            "<ar:Iva><ar:AlicIva><ar:Id>5</ar:Id><ar:BaseImp>100.00</ar:BaseImp><ar:Importe>21.00</ar:Importe></ar:AlicIva></ar:Iva>"
        )));
        assert!(!envelope.contains("FchServDesde"));
    }

    #[tokio::test]
    async fn test_service_dates_only_for_services() {
        let transport = Arc::new(ScriptedTransport::new().reply(wrap(
            r#"<FECAESolicitarResponse xmlns="http://ar.gov.afip.dif.FEV1/"><FECAESolicitarResult><FeCabResp><Resultado>A</Resultado></FeCabResp><FeDetResp><FECAEDetResponse><CbteDesde>43</CbteDesde><Resultado>A</Resultado><CAE>1</CAE></FECAEDetResponse></FeDetResp></FECAESolicitarResult></FECAESolicitarResponse>"#,
        )));
        let mut services = detail();
        services.concept = Concept::Services;
        services.service_from = NaiveDate::from_ymd_opt(2025, 6, 1);
        services.service_to = NaiveDate::from_ymd_opt(2025, 6, 30);
        services.payment_due = NaiveDate::from_ymd_opt(2025, 7, 15);

        client(&transport)
            .request_cae(&auth(), 1, VoucherType::FacturaA, &services)
            .await
            .unwrap();

        let envelope = &transport.calls()[0].envelope;
        assert!(envelope.contains(
            "<ar:ImpIVA>21.00</ar:ImpIVA><ar:FchServDesde>20250601</ar:FchServDesde><ar:FchServHasta>20250630</ar:FchServHasta><ar:FchVtoPago>20250715</ar:FchVtoPago><ar:MonId>"
        ));
    }

    #[tokio::test]
    async fn test_request_cae_rejected_keeps_observations() {
        let transport = Arc::new(ScriptedTransport::new().reply(wrap(
            r#"<FECAESolicitarResponse xmlns="http://ar.gov.afip.dif.FEV1/"><FECAESolicitarResult>
                <FeCabResp><Resultado>R</Resultado></FeCabResp>
                <FeDetResp><FECAEDetResponse><CbteDesde>43</CbteDesde><Resultado>R</Resultado>
                <Observaciones><Obs><Code>10015</Code><Msg>Campo DocNro invalido</Msg></Obs></Observaciones>
                <CAE/><CAEFchVto/></FECAEDetResponse></FeDetResp>
            </FECAESolicitarResult></FECAESolicitarResponse>"#,
        )));

        let result = client(&transport)
            .request_cae(&auth(), 1, VoucherType::FacturaA, &detail())
            .await
            .unwrap();

        assert_eq!(result.result, AuthorizationResult::Rejected);
        assert!(!result.is_approved());
        assert_eq!(result.cae, None);
        assert_eq!(result.observations[0].code, "10015");
    }

    #[tokio::test]
    async fn test_request_cae_rejected_as_a_whole() {
        let transport = Arc::new(ScriptedTransport::new().reply(wrap(
            r#"<FECAESolicitarResponse xmlns="http://ar.gov.afip.dif.FEV1/"><FECAESolicitarResult><Errors><Err><Code>10016</Code><Msg>El numero o fecha del comprobante no se corresponde con el proximo a autorizar</Msg></Err></Errors></FECAESolicitarResult></FECAESolicitarResponse>"#,
        )));

        let err = client(&transport)
            .request_cae(&auth(), 1, VoucherType::FacturaA, &detail())
            .await
            .unwrap_err();
        assert!(matches!(err, AfipError::ServiceError { ref errors, .. } if errors[0].code == "10016"));
    }

    #[tokio::test]
    async fn test_vat_types() {
        let transport = Arc::new(ScriptedTransport::new().reply(wrap(
            r#"<FEParamGetTiposIvaResponse xmlns="http://ar.gov.afip.dif.FEV1/"><FEParamGetTiposIvaResult><ResultGet>
                <IvaTipo><Id>3</Id><Desc>0%</Desc><FchDesde>20090220</FchDesde><FchHasta>NULL</FchHasta></IvaTipo>
                <IvaTipo><Id>5</Id><Desc>21%</Desc><FchDesde>20090220</FchDesde><FchHasta>NULL</FchHasta></IvaTipo>
            </ResultGet></FEParamGetTiposIvaResult></FEParamGetTiposIvaResponse>"#,
        )));

        let types = client(&transport).vat_types(&auth()).await.unwrap();

        assert_eq!(types.len(), 2);
        assert_eq!(types[1].id, "5");
        assert_eq!(types[1].description, "21%");
        assert_eq!(types[1].valid_from, NaiveDate::from_ymd_opt(2009, 2, 20));
        assert_eq!(types[1].valid_to, None);
    }

    #[tokio::test]
    async fn test_query_voucher() {
        let transport = Arc::new(ScriptedTransport::new().reply(wrap(
            r#"<FECompConsultarResponse xmlns="http://ar.gov.afip.dif.FEV1/"><FECompConsultarResult><ResultGet>
                <Concepto>1</Concepto><DocTipo>96</DocTipo><DocNro>27225103</DocNro><CbteDesde>7</CbteDesde><CbteHasta>7</CbteHasta>
                <CbteFch>20250630</CbteFch><ImpTotal>121</ImpTotal><Resultado>A</Resultado><CodAutorizacion>75261234567890</CodAutorizacion>
                <EmisionTipo>CAE</EmisionTipo><FchVto>20250710</FchVto><PtoVta>1</PtoVta><CbteTipo>6</CbteTipo>
            </ResultGet></FECompConsultarResult></FECompConsultarResponse>"#,
        )));

        let record = client(&transport)
            .query_voucher(&auth(), 1, VoucherType::FacturaB, 7)
            .await
            .unwrap();

        assert_eq!(record.doc_type, Some(DocType::Dni));
        assert_eq!(record.total, Some(dec!(121)));
        assert_eq!(record.authorization_code.as_deref(), Some("75261234567890"));
        assert_eq!(record.result, Some(AuthorizationResult::Approved));
        assert!(transport.calls()[0]
            .envelope
            .contains("<ar:FeCompConsReq><ar:CbteTipo>6</ar:CbteTipo><ar:CbteNro>7</ar:CbteNro><ar:PtoVta>1</ar:PtoVta></ar:FeCompConsReq>"));
    }
}
