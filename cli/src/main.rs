use std::path::PathBuf;

use anyhow::Result;
use convnet_core::prelude::DataFormat;
use structopt::StructOpt;

mod dump;
mod records;

fn main() {
    let cli_args = CliArgs::from_args();

    if std::env::var("RUST_LOG").is_err() {
        let level = match cli_args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        unsafe { std::env::set_var("RUST_LOG", level) };
    }
    env_logger::Builder::from_env(env_logger::Env::default()).init();

    if let Err(e) = cli_args.command.run() {
        log::error!("{e:?}");
        std::process::exit(1)
    }
}

#[derive(Debug, StructOpt)]
#[structopt(name = "convnet", about = "Inception graphs and TFRecord datasets")]
pub struct CliArgs {
    /// Sets the level of verbosity (repeat for more).
    #[structopt(short = "v", parse(from_occurrences), global = true)]
    pub verbosity: usize,

    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Build a network and print its nodes.
    Dump(DumpArgs),
    /// Decode every record of TFRecord files.
    Records {
        #[structopt(parse(from_os_str), required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Debug, StructOpt)]
pub struct DumpArgs {
    /// inception3 or inception4
    #[structopt(long, default_value = "inception3")]
    pub model: String,

    #[structopt(long, default_value = "299")]
    pub image_size: usize,

    #[structopt(long, default_value = "32")]
    pub batch_size: usize,

    /// NHWC or NCHW
    #[structopt(long, default_value = "NHWC")]
    pub data_format: DataFormat,

    /// Add the auxiliary head (inception3 only).
    #[structopt(long)]
    pub auxiliary: bool,

    #[structopt(long)]
    pub no_batch_norm: bool,

    /// Evaluation graph: no dropout.
    #[structopt(long)]
    pub eval: bool,

    /// Append a classification layer with that many classes.
    #[structopt(long)]
    pub num_classes: Option<usize>,
}

impl Command {
    pub fn run(&self) -> Result<()> {
        match self {
            Command::Dump(args) => dump::handle(args),
            Command::Records { files } => records::handle(files),
        }
    }
}
