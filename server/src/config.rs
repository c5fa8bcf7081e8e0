use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use vault_common::lightning_gateway::LightningGateway;

use crate::lnbits::{LnbitsConfig, LnbitsGateway, DEFAULT_ENDPOINT};
use crate::mock::MockGateway;

#[derive(Parser, Debug)]
#[command(name = "vault-server", about = "Demo Bitcoin/Lightning wallet server")]
pub struct Cli {
    /// HTTP port to listen on.
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Interface to bind.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Base URL of the LNbits instance.
    #[arg(long, env = "LNBITS_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub lnbits_endpoint: String,

    /// LNbits invoice/read key.
    #[arg(long, env = "LNBITS_API_KEY", hide_env_values = true)]
    pub lnbits_api_key: Option<String>,

    /// LNbits admin key.
    #[arg(long, env = "LNBITS_ADMIN_KEY", hide_env_values = true)]
    pub lnbits_admin_key: Option<String>,

    /// Deadline for each Lightning provider call, in seconds.
    #[arg(long, default_value_t = 30)]
    pub provider_timeout_secs: u64,

    /// Use the in-process mock gateway instead of LNbits.
    #[arg(long)]
    pub mock_lightning: bool,
}

impl Cli {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// Pick the Lightning backend. LNbits needs both keys.
    pub fn gateway(&self) -> anyhow::Result<Box<dyn LightningGateway>> {
        if self.mock_lightning {
            return Ok(Box::new(MockGateway::new()));
        }
        let (Some(api_key), Some(admin_key)) = (&self.lnbits_api_key, &self.lnbits_admin_key)
        else {
            bail!("LNbits configuration missing: set LNBITS_API_KEY and LNBITS_ADMIN_KEY, or pass --mock-lightning");
        };
        let gateway = LnbitsGateway::connect(LnbitsConfig {
            endpoint: self.lnbits_endpoint.clone(),
            api_key: api_key.clone(),
            admin_key: admin_key.clone(),
            request_timeout: self.provider_timeout(),
        })
        .context("Failed to set up LNbits gateway")?;
        Ok(Box::new(gateway))
    }
}
