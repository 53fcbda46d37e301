use crate::domain::ports::CmsSigner;
use crate::utils::error::{AfipError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Signs TRAs with `openssl smime -sign -nodetach -outform DER`.
#[derive(Debug, Clone)]
pub struct OpensslSigner {
    openssl_bin: PathBuf,
    certificate: PathBuf,
    private_key: PathBuf,
}

impl OpensslSigner {
    pub fn new(
        openssl_bin: impl Into<PathBuf>,
        certificate: impl Into<PathBuf>,
        private_key: impl Into<PathBuf>,
    ) -> Self {
        Self {
            openssl_bin: openssl_bin.into(),
            certificate: certificate.into(),
            private_key: private_key.into(),
        }
    }

    fn check_inputs(&self) -> Result<()> {
        for (label, path) in [("certificate", &self.certificate), ("private key", &self.private_key)] {
            if !path.is_file() {
                return Err(AfipError::SigningError {
                    message: format!("{} not found at {}", label, path.display()),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CmsSigner for OpensslSigner {
    async fn sign(&self, content: &[u8]) -> Result<Vec<u8>> {
        self.check_inputs()?;

        let mut child = Command::new(&self.openssl_bin)
            .args(["smime", "-sign", "-signer"])
            .arg(&self.certificate)
            .arg("-inkey")
            .arg(&self.private_key)
            .args(["-outform", "DER", "-nodetach"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AfipError::SigningError {
                message: format!("cannot run {}: {}", self.openssl_bin.display(), e),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(content).await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(AfipError::SigningError {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if output.stdout.is_empty() {
            return Err(AfipError::SigningError {
                message: "openssl produced no output".to_string(),
            });
        }

        tracing::debug!("Signed TRA ({} bytes of CMS)", output.stdout.len());
        Ok(output.stdout)
    }
}
