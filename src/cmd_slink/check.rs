use clap::*;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("check")
        .about("Validate a distance matrix")
        .after_help(
            r###"
Checks that the input is a distance matrix.

Checks, in order:
* Every row is a list of numbers (JSON input only)
* The matrix and its rows are non-empty
* The matrix is square
* The diagonal is zero
* The matrix is symmetric
* No distance is negative

On success prints `OK` and the number of items. On failure exits with an
error naming the first failing check.

Examples:
1. Validate a PHYLIP matrix:
   slink check matrix.phy

2. Validate a JSON literal:
   echo '[[0,1],[1,0]]' | slink check stdin --json

"###,
        );

    super::matrix_args(cmd).arg(super::outfile_arg())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let mut writer = slink::writer(args.get_one::<String>("outfile").unwrap())?;

    let matrix = super::load_matrix(args)?;
    writer.write_fmt(format_args!("OK\t{}\n", matrix.size()))?;

    Ok(())
}
