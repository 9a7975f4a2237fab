use clap::{Parser, Subcommand};

/// ocistore - OCI Object Storage client with signed requests
#[derive(Parser, Debug)]
#[command(name = "ocistore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// YAML config file (defaults to OCI_* environment variables)
    #[arg(long, global = true, env = "OCISTORE_CONFIG")]
    pub config: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Disable TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a local file
    Put {
        /// Local file to upload
        #[arg(value_name = "FILE")]
        file: String,

        /// Object name (defaults to the file's base name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Download an object
    Get {
        /// Object name
        #[arg(value_name = "OBJECT")]
        object: String,

        /// Output path, `-` for stdout (defaults to the object's base name)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Delete an object
    Rm {
        /// Object name
        #[arg(value_name = "OBJECT")]
        object: String,

        /// Delete without confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// List objects in the bucket
    Ls {
        /// Only list names starting with this prefix
        #[arg(long, default_value = "")]
        prefix: String,

        /// Page size (0 = service default)
        #[arg(long, default_value = "0")]
        limit: u32,

        /// Follow pagination until the last page
        #[arg(short, long)]
        all: bool,
    },

    /// Check that the bucket is reachable with the configured credentials
    Test,

    /// Print the active configuration without key material
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_put() {
        let cli = Cli::try_parse_from(["ocistore", "put", "report.pdf", "--name", "docs/report.pdf"])
            .unwrap();
        match cli.command {
            Commands::Put { file, name } => {
                assert_eq!(file, "report.pdf");
                assert_eq!(name.as_deref(), Some("docs/report.pdf"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(!cli.insecure);
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn test_parse_ls_defaults() {
        let cli = Cli::try_parse_from(["ocistore", "--insecure", "ls"]).unwrap();
        assert!(cli.insecure);
        match cli.command {
            Commands::Ls { prefix, limit, all } => {
                assert_eq!(prefix, "");
                assert_eq!(limit, 0);
                assert!(!all);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ocistore",
            "get",
            "a.txt",
            "-o",
            "-",
            "--config",
            "oci.yaml",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some("oci.yaml"));
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn test_object_required() {
        assert!(Cli::try_parse_from(["ocistore", "rm"]).is_err());
        assert!(Cli::try_parse_from(["ocistore", "get"]).is_err());
    }
}
