use clap::Parser;
use std::error::Error;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use apebase_web::ViewerServerConfig;

const DEFAULT_ADDR: &str = "0.0.0.0:3010";
const DEFAULT_PUBLIC_DIR: &str = "public";
const DEFAULT_DB_FILE: &str = "public/apebase/db";
const DEFAULT_IPFS_DIR: &str = "public/apebase/ipfs";
const DEFAULT_DB_NAMESPACE: &str = "apebase";
const DEFAULT_DB_NAME: &str = "apebase";

#[derive(Parser, Debug)]
#[command(name = "apebased", version, about = "Apebase token viewer daemon.")]
pub struct CliArgs {
    #[arg(long, env = "APEBASE_ADDR", default_value = DEFAULT_ADDR)]
    addr: SocketAddr,

    #[arg(long, env = "APEBASE_PUBLIC_DIR", default_value = DEFAULT_PUBLIC_DIR)]
    public_dir: PathBuf,

    #[arg(long, env = "APEBASE_DB_FILE", default_value = DEFAULT_DB_FILE)]
    db_file: PathBuf,

    #[arg(long, env = "APEBASE_IPFS_DIR", default_value = DEFAULT_IPFS_DIR)]
    ipfs_dir: PathBuf,

    #[arg(long, env = "APEBASE_DB_NAMESPACE", default_value = DEFAULT_DB_NAMESPACE)]
    db_namespace: String,

    #[arg(long, env = "APEBASE_DB_NAME", default_value = DEFAULT_DB_NAME)]
    db_name: String,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Debug, Clone)]
pub struct ApebaseConfig {
    pub addr: SocketAddr,
    pub public_dir: PathBuf,
    pub db_file: PathBuf,
    pub ipfs_dir: PathBuf,
    pub db_namespace: String,
    pub db_name: String,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingSetting(&'static str),
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting(name) => write!(f, "missing required setting: {name}"),
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value:?}")
            }
        }
    }
}

impl Error for ConfigError {}

impl ApebaseConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        Self::try_from(CliArgs::parse())
    }

    pub fn server_config(&self) -> ViewerServerConfig {
        ViewerServerConfig::new(self.addr)
            .with_public_dir(&self.public_dir)
            .with_ipfs_dir(&self.ipfs_dir)
    }
}

fn require_name(name: &'static str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidSetting { name, value });
    }
    Ok(value)
}

impl TryFrom<CliArgs> for ApebaseConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.db_file.as_os_str().is_empty() {
            return Err(ConfigError::MissingSetting("APEBASE_DB_FILE"));
        }

        Ok(Self {
            addr: args.addr,
            public_dir: args.public_dir,
            db_file: args.db_file,
            ipfs_dir: args.ipfs_dir,
            db_namespace: require_name("APEBASE_DB_NAMESPACE", args.db_namespace)?,
            db_name: require_name("APEBASE_DB_NAME", args.db_name)?,
        })
    }
}
