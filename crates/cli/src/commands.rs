use clap::{ArgGroup, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Copy every selected table into its collection and save the new cursors
    Sync {
        #[arg(long, help = "Settings file path")]
        config: PathBuf,

        #[arg(long, help = "The settings file is base64 encoded")]
        encoded: bool,

        #[arg(
            long,
            value_delimiter = ',',
            help = "Only sync these tables, ignoring IsSelected"
        )]
        tables: Vec<String>,

        #[arg(long, default_value_t = 1, help = "Mappings to run concurrently")]
        parallel: usize,

        #[arg(long, help = "Write the JSON run report to this file")]
        report: Option<PathBuf>,

        #[arg(long, help = "Do not write the final cursors back to the settings file")]
        no_save: bool,
    },
    /// Check that a source or target connection works
    #[command(group(ArgGroup::new("endpoint").required(true).args(["source", "target"])))]
    TestConn {
        /// SQL Server connection string
        #[arg(long)]
        source: Option<String>,

        /// MongoDB connection string, including the database name
        #[arg(long)]
        target: Option<String>,
    },
    /// Build a settings file with one mapping per table that has a primary key
    Tables {
        #[arg(long, help = "SQL Server connection string")]
        source: String,

        #[arg(long, help = "MongoDB connection string")]
        target: String,

        #[arg(long, help = "Write the settings to this file instead of stdout")]
        output: Option<PathBuf>,

        #[arg(long, help = "Write the settings base64 encoded")]
        encoded: bool,
    },
    /// Print the columns of a source table as JSON
    Schema {
        #[arg(long, help = "SQL Server connection string")]
        source: String,

        #[arg(long, help = "Table name, optionally schema-qualified")]
        table: String,
    },
    /// Base64 encode a settings file
    Encode {
        #[arg(long, help = "Plain settings file path")]
        config: PathBuf,

        #[arg(long, help = "Write to this file instead of stdout")]
        output: Option<PathBuf>,
    },
    /// Decode a base64 encoded settings file
    Decode {
        #[arg(long, help = "Encoded settings file path")]
        input: PathBuf,

        #[arg(long, help = "Write to this file instead of stdout")]
        output: Option<PathBuf>,
    },
}
