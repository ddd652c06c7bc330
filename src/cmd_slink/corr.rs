use clap::*;
use slink::libs::heatmap::{cluster_traits, TraitTable};
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("corr")
        .about("Correlation distances between traits")
        .after_help(
            r###"
Computes `1 - r` between every pair of traits, where `r` is the Pearson
correlation over the strains both traits have values for.

Notes:
* Input: tab-separated table. The header lists strains after a label column;
  each line is a trait name followed by its values.
* Missing values: NA, x, - or an empty cell. Infinite values and repeated
  strain names are errors.
* Distances below zero are floored at 0. An undefined correlation (fewer
  than two shared strains, or a constant trait) gives a distance of 1.
* Output: relaxed PHYLIP matrix, usable by `slink cluster`.

Examples:
1. Distances over all strains:
   slink corr traits.tsv -o traits.phy

2. Restrict to a list of strains:
   slink corr traits.tsv --strains strains.txt

"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Input trait table. [stdin] for standard input"),
        )
        .arg(
            Arg::new("strains")
                .long("strains")
                .num_args(1)
                .help("File listing the strains to use, one per line"),
        )
        .arg(super::outfile_arg())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let mut writer = slink::writer(args.get_one::<String>("outfile").unwrap())?;

    let infile = args.get_one::<String>("infile").unwrap();
    let table = TraitTable::from_tsv(slink::reader(infile)?)?;

    let strainlist = match args.get_one::<String>("strains") {
        Some(file) => slink::read_first_column(file)?,
        None => table.strains().to_vec(),
    };

    let names = table.names();
    let vectors: Vec<_> = names
        .iter()
        .filter_map(|name| table.export_trait_data(name, &strainlist))
        .collect();

    let mut matrix = cluster_traits(&vectors)?;
    matrix.set_names(names)?;

    writer.write_all(matrix.to_phylip().as_ref())?;

    Ok(())
}
