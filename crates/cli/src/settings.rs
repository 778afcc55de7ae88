//! Configuration layering: built-in defaults, then an optional TOML file, then
//! command-line flags and environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use resolver::{ContractAddress, Endpoint, IpfsGateway, ResolverConfig};

/// Flags that override [`ResolverConfig`] fields.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// TOML file overriding the built-in defaults.
    #[arg(long, env = "NORMIE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// JSON-RPC endpoint, in priority order. Repeat (or comma-separate) to
    /// give several; replaces the configured list.
    #[arg(long = "rpc-url", env = "NORMIE_RPC_URLS", value_delimiter = ',', global = true)]
    pub rpc_urls: Vec<String>,

    /// IPFS gateway prefix, e.g. `https://ipfs.io/ipfs/`.
    #[arg(long, env = "NORMIE_IPFS_GATEWAY", global = true)]
    pub gateway: Option<String>,

    /// Contract exposing `tokenURI(uint256)`.
    #[arg(long, env = "NORMIE_CONTRACT", global = true)]
    pub contract: Option<String>,
}

/// Builds and validates the effective configuration.
pub fn load(args: &ConfigArgs) -> anyhow::Result<ResolverConfig> {
    let mut config = match &args.config {
        Some(path) => from_file(path)?,
        None => ResolverConfig::default(),
    };
    apply_overrides(&mut config, args)?;
    config.validate()?;
    Ok(config)
}

fn from_file(path: &Path) -> anyhow::Result<ResolverConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
}

fn apply_overrides(config: &mut ResolverConfig, args: &ConfigArgs) -> anyhow::Result<()> {
    if !args.rpc_urls.is_empty() {
        config.endpoints = args
            .rpc_urls
            .iter()
            .map(|url| Endpoint::new(url.trim()).context("--rpc-url must not be empty"))
            .collect::<anyhow::Result<_>>()?;
    }
    if let Some(gateway) = &args.gateway {
        config.ipfs_gateway = IpfsGateway::new(gateway.trim()).context("--gateway must not be empty")?;
    }
    if let Some(contract) = &args.contract {
        config.contract =
            ContractAddress::new(contract.trim()).context("--contract must not be empty")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let config = load(&ConfigArgs::default()).unwrap();
        assert_eq!(config, ResolverConfig::default());
    }

    #[test]
    fn toml_documents_override_selected_fields() {
        let config: ResolverConfig = toml::from_str(
            r#"
            endpoints = ["https://eth.llamarpc.com", "https://rpc.ankr.com/eth"]
            endpoint_timeout_secs = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.endpoints[0].as_str(), "https://eth.llamarpc.com");
        assert_eq!(config.endpoint_timeout_secs, 3);
        assert_eq!(config.collection_name, "Normie");
    }

    #[test]
    fn unknown_toml_keys_are_rejected() {
        let result: Result<ResolverConfig, _> = toml::from_str("endpiont = []");
        assert!(result.is_err());
    }

    #[test]
    fn effective_config_round_trips_through_toml() {
        let text = toml::to_string_pretty(&ResolverConfig::default()).unwrap();
        let parsed: ResolverConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, ResolverConfig::default());
    }

    #[test]
    fn flags_override_file_values() {
        let args = ConfigArgs {
            rpc_urls: vec!["https://a.example".into(), " https://b.example ".into()],
            gateway: Some("https://ipfs.io/ipfs".into()),
            contract: Some("0x0000000000000000000000000000000000000001".into()),
            ..ConfigArgs::default()
        };

        let config = load(&args).unwrap();

        let urls: Vec<&str> = config.endpoints.iter().map(|e| e.as_str()).collect();
        assert_eq!(urls, ["https://a.example", "https://b.example"]);
        assert_eq!(config.ipfs_gateway.as_str(), "https://ipfs.io/ipfs/");
        assert_eq!(
            config.contract.as_str(),
            "0x0000000000000000000000000000000000000001"
        );
    }

    #[test]
    fn empty_flag_values_are_rejected() {
        let args = ConfigArgs {
            rpc_urls: vec!["https://a.example".into(), "".into()],
            ..ConfigArgs::default()
        };
        assert!(load(&args).is_err());
    }

    #[test]
    fn missing_config_file_is_reported_with_its_path() {
        let args = ConfigArgs {
            config: Some(PathBuf::from("/nonexistent/normie.toml")),
            ..ConfigArgs::default()
        };
        let err = load(&args).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/normie.toml"));
    }
}
