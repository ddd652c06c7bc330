use clap::*;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("nearest")
        .about("Distance between two items of a matrix")
        .after_help(
            r###"
Validates the matrix, then prints the distance between items <i> and <j>.

Notes:
* Indices are 0-based row numbers.
* The lookup is symmetric: `nearest i j` equals `nearest j i`.

Examples:
1. Distance between the first and third items:
   slink nearest matrix.phy 0 2

"###,
        );

    super::matrix_args(cmd)
        .arg(
            Arg::new("i")
                .required(true)
                .index(2)
                .value_parser(value_parser!(usize))
                .help("Row index"),
        )
        .arg(
            Arg::new("j")
                .required(true)
                .index(3)
                .value_parser(value_parser!(usize))
                .help("Column index"),
        )
        .arg(super::outfile_arg())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let mut writer = slink::writer(args.get_one::<String>("outfile").unwrap())?;

    let i = *args.get_one::<usize>("i").unwrap();
    let j = *args.get_one::<usize>("j").unwrap();

    let matrix = super::load_matrix(args)?;
    let distance = matrix
        .nearest(i, j)
        .map_err(|e| anyhow::anyhow!("{}: {}", e.kind(), e))?;

    writer.write_fmt(format_args!("{}\n", distance))?;

    Ok(())
}
