use afip_client::config::{cli::VoucherSelector, AfipConfig, Cli, Command};
use afip_client::domain::model::{services, ParamItem, ServiceMessage, VoucherRecord};
use afip_client::utils::error::{AfipError, ErrorSeverity, Result};
use afip_client::utils::{logger, validation::Validate};
use afip_client::Afip;
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting afip CLI");
    tracing::debug!("CLI args: {:?}", cli);

    if let Err(e) = run(cli).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AfipConfig::from_file(&cli.config)?;

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        return Err(e);
    }

    let afip = Afip::from_config(&config)?;

    match cli.command {
        Command::Login { service, force } => {
            let ticket = afip.login(&service, force).await?;
            println!("✅ Ticket for {} valid until {}", service, ticket.expiration_time);
            println!("   token: {}", logger::redact(&ticket.token));
        }
        Command::Status => {
            let status = afip.server_status().await?;
            println!(
                "AppServer={} DbServer={} AuthServer={}",
                status.app_server, status.db_server, status.auth_server
            );
            if !status.is_healthy() {
                return Err(AfipError::ServiceError {
                    service: services::WSFE.to_string(),
                    errors: vec![ServiceMessage::new(
                        "FEDummy",
                        "one or more WSFE servers are down",
                    )],
                });
            }
        }
        Command::LastVoucher(selector) => {
            let (point_of_sale, voucher_type) = selector.resolve(&config);
            let last = afip.last_voucher(point_of_sale, voucher_type).await?;
            println!(
                "Last {} voucher at point of sale {}: {}",
                voucher_type.letter(),
                last.point_of_sale,
                last.number
            );
        }
        Command::Issue(args) => {
            let order = args.to_order(&config);
            let issued = afip.issue(&order).await?;
            println!(
                "✅ {} {:04}-{:08} CAE {} due {}",
                order.voucher_type.letter(),
                order.point_of_sale,
                issued.number(),
                issued.cae().unwrap_or_default(),
                issued
                    .authorization
                    .cae_due_date
                    .map(|d| d.to_string())
                    .unwrap_or_default()
            );
            for obs in &issued.authorization.observations {
                println!("   ⚠️ [{}] {}", obs.code, obs.message);
            }
            if args.qr {
                println!("{}", afip.qr_url(&issued)?);
            }
        }
        Command::Batch { input, output } => {
            let summary = afip.run_batch(&input, &output).await?;
            println!(
                "📊 {} rows: {} approved, {} rejected, {} failed. Results in {}",
                summary.total,
                summary.approved,
                summary.rejected,
                summary.failed,
                output.display()
            );
        }
        Command::VatTypes => print_table(&afip.vat_types().await?),
        Command::VoucherTypes => print_table(&afip.voucher_types().await?),
        Command::Voucher { number, selector } => {
            let record = lookup_voucher(&afip, &config, &selector, number).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Taxpayer { cuit } => {
            let taxpayer = afip.taxpayer(cuit).await?;
            println!("{}", serde_json::to_string_pretty(&taxpayer)?);
        }
        Command::Waybill { ctg, pdf_out } => {
            let waybill = afip.waybill(&ctg).await?;
            println!("CTG {} status {}", waybill.ctg_number, waybill.status().unwrap_or("?"));
            for (path, value) in &waybill.fields {
                println!("  {}: {}", path, value);
            }
            match (pdf_out, &waybill.pdf) {
                (Some(path), Some(pdf)) => {
                    std::fs::write(&path, pdf)?;
                    println!("📁 PDF saved to: {}", path.display());
                }
                (Some(_), None) => println!("⚠️ The response carried no PDF"),
                _ => {}
            }
        }
    }

    Ok(())
}

async fn lookup_voucher(
    afip: &Afip,
    config: &AfipConfig,
    selector: &VoucherSelector,
    number: u64,
) -> Result<VoucherRecord> {
    let (point_of_sale, voucher_type) = selector.resolve(config);
    afip.voucher(point_of_sale, voucher_type, number).await
}

fn print_table(items: &[ParamItem]) {
    for item in items {
        println!("{:>4}  {}", item.id, item.description);
    }
}
