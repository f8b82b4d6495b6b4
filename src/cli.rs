use clap::builder::styling::AnsiColor;
use clap::builder::Styles;
use clap::{Parser, Subcommand};

use crate::bucket::{DEFAULT_BIN_WIDTH, DEFAULT_OFFSET, MAX_OFFSET};

const fn extra_build_info() -> &'static str {
    match option_env!("CARGO_BUILD_DESC") {
        Some(e) => e,
        None => env!("CARGO_PKG_VERSION"),
    }
}
pub const VERSION: &str = extra_build_info();
const INFO_STRING: &str = "
readsort version ";
const AFTER_STRING: &str = "
   ──────────────────────────────────
   sort .fastq reads by length or by exact reference match";

// colouring of the help
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().bold())
    .usage(AnsiColor::BrightMagenta.on_default().bold())
    .literal(AnsiColor::BrightMagenta.on_default())
    .placeholder(AnsiColor::White.on_default());

#[derive(Parser)]
#[command(
    version = VERSION,
    about = format!("{}{}{}", INFO_STRING, VERSION, AFTER_STRING),
    arg_required_else_help = true,
    flatten_help = true,
    styles = STYLES
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sort reads into buckets by sequence length. A read of length L is placed in bucket
    /// round((L - offset) / width), with halves rounded to the nearest even bucket.
    #[command(arg_required_else_help = true)]
    Bin {
        /// the input .fastq file(s)
        #[arg(required = true)]
        input: Vec<String>,

        /// the output directory, which will hold one B<k>.fastq per bucket and read_stats.txt
        #[arg(short, long, default_value = ".")]
        output: String,

        /// the read length at the centre of bucket 0
        #[arg(
            long,
            default_value_t = DEFAULT_OFFSET,
            allow_negative_numbers = true,
            value_parser = clap::value_parser!(i64).range(-MAX_OFFSET..=MAX_OFFSET)
        )]
        offset: i64,

        /// the width of each bucket, in bases
        #[arg(
            long,
            default_value_t = DEFAULT_BIN_WIDTH,
            value_parser = clap::value_parser!(u32).range(1..)
        )]
        width: u32,

        /// overwrite, instead of error on, bucket files which already contain reads
        #[arg(long, action)]
        force: bool,

        /// also write the statistics as read_stats.json
        #[arg(long, action)]
        json: bool,
    },

    /// Sort reads by the reference sequence they are identical to. Reads which match no
    /// reference are written to unmatched.fastq.
    #[command(arg_required_else_help = true)]
    Match {
        /// the input .fastq file(s)
        #[arg(required = true)]
        input: Vec<String>,

        /// the reference .fasta file. Each reference is named by its header, up to the
        /// first whitespace; if several references share a sequence, the first one wins.
        #[arg(short, long)]
        reference: String,

        /// the output directory, which will hold one .fastq per reference, unmatched.fastq and
        /// statistics.txt
        #[arg(short, long, default_value = "output")]
        output: String,

        /// overwrite, instead of error on, output files which already contain reads
        #[arg(long, action)]
        force: bool,

        /// also write the statistics as statistics.json
        #[arg(long, action)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bin_defaults() {
        let cli = Cli::parse_from(["readsort", "bin", "reads.fastq"]);
        match cli.command {
            Commands::Bin {
                input,
                output,
                offset,
                width,
                force,
                json,
            } => {
                assert_eq!(input, vec!["reads.fastq"]);
                assert_eq!(output, ".");
                assert_eq!(offset, 70);
                assert_eq!(width, 15);
                assert!(!force);
                assert!(!json);
            }
            _ => panic!("expected the bin subcommand"),
        }
    }

    #[test]
    fn negative_offset_and_zero_width() {
        let cli = Cli::try_parse_from(["readsort", "bin", "a.fastq", "--offset", "-5"]).unwrap();
        assert!(matches!(cli.command, Commands::Bin { offset: -5, .. }));

        assert!(Cli::try_parse_from(["readsort", "bin", "a.fastq", "--width", "0"]).is_err());
    }

    #[test]
    fn offset_out_of_range() {
        let parse = |offset: i64| {
            let offset = offset.to_string();
            Cli::try_parse_from(["readsort", "bin", "a.fastq", "--offset", offset.as_str()])
        };

        assert!(parse(i64::MIN).is_err());
        assert!(parse(-MAX_OFFSET - 1).is_err());
        assert!(parse(-MAX_OFFSET).is_ok());
        assert!(parse(MAX_OFFSET).is_ok());
    }

    #[test]
    fn match_requires_a_reference() {
        assert!(Cli::try_parse_from(["readsort", "match", "a.fastq"]).is_err());

        let cli =
            Cli::try_parse_from(["readsort", "match", "a.fastq", "b.fastq", "-r", "ref.fasta"])
                .unwrap();
        match cli.command {
            Commands::Match {
                input,
                reference,
                output,
                ..
            } => {
                assert_eq!(input, vec!["a.fastq", "b.fastq"]);
                assert_eq!(reference, "ref.fasta");
                assert_eq!(output, "output");
            }
            _ => panic!("expected the match subcommand"),
        }
    }
}
