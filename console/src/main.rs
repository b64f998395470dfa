mod commands;
mod utils;

use clap::{
    Parser,
    Subcommand,
};
use commands::{
    DumpArgs,
    EraseArgs,
    MergeArgs,
    StatsArgs,
    XmlArgs,
};
use utils::UtilsArgs;
use wild::ArgsOs;

#[derive(Parser, Debug)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None,)]
struct Cli {
    #[command(subcommand)]
    command: MainMenu,
}

#[derive(Subcommand, Debug)]
enum MainMenu {
    /// Merge the files and print the feature tree.
    Dump {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  DumpArgs,
    },

    /// Merge the files and write the feature tree as XML.
    Xml {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  XmlArgs,
    },

    /// Merge the files in order and summarise the result as JSON.
    Merge {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  MergeArgs,
    },

    /// Merge the files, then erase the features of others.
    Erase {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  EraseArgs,
    },

    /// Parse each file and report parser statistics as JSON.
    Stats {
        #[clap(flatten)]
        utils: UtilsArgs,
        #[clap(flatten)]
        args:  StatsArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let args: ArgsOs = wild::args_os();
    let cli = Cli::parse_from(args);

    match cli.command {
        MainMenu::Dump { utils, args } => {
            utils.setup()?;
            args.run(&utils)?;
        },
        MainMenu::Xml { utils, args } => {
            utils.setup()?;
            args.run(&utils)?;
        },
        MainMenu::Merge { utils, args } => {
            utils.setup()?;
            args.run(&utils)?;
        },
        MainMenu::Erase { utils, args } => {
            utils.setup()?;
            args.run(&utils)?;
        },
        MainMenu::Stats { utils, args } => {
            utils.setup()?;
            args.run(&utils)?;
        },
    }
    Ok(())
}
