//! Subcommand modules for the `slink` binary.

use clap::*;
use slink::libs::matrix::DistanceMatrix;

pub mod check;
pub mod cluster;
pub mod corr;
pub mod heatmap;
pub mod marker;
pub mod nearest;

/// Positional input file and `--json` switch shared by the matrix commands.
pub fn matrix_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("infile")
            .required(true)
            .index(1)
            .help("Input matrix file. [stdin] for standard input"),
    )
    .arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Read the matrix as a JSON nested array, e.g. [[0,1],[1,0]]"),
    )
}

pub fn outfile_arg() -> Arg {
    Arg::new("outfile")
        .short('o')
        .long("outfile")
        .num_args(1)
        .default_value("stdout")
        .help("Output filename. [stdout] for screen")
}

/// Read and validate the matrix named by `infile`.
pub fn load_matrix(args: &ArgMatches) -> anyhow::Result<DistanceMatrix> {
    let infile = args.get_one::<String>("infile").unwrap();

    let result = if args.get_flag("json") {
        let text = slink::read_to_string(infile)?;
        DistanceMatrix::from_json(&text)
    } else {
        DistanceMatrix::from_phylip(slink::reader(infile)?)
    };

    let matrix = result.map_err(|e| anyhow::anyhow!("{}: {}", e.kind(), e))?;
    log::info!("Loaded a {0}x{0} matrix from {1}", matrix.size(), infile);
    Ok(matrix)
}
