use clap::*;
use slink::libs::heatmap::{nearest_markers, read_loci};
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("marker")
        .about("Nearest marker of each trait")
        .after_help(
            r###"
For each trait, finds the marker on the same chromosome with the smallest
distance in Mb.

Notes:
* Both inputs are `name<TAB>chr<TAB>mb`; an optional header line is skipped.
* Chromosomes are compared as strings.
* Ties keep the first marker in file order.
* Prints `trait<TAB>marker`, with NA when the chromosome has no markers.

Examples:
1. slink marker markers.tsv traits.tsv

"###,
        )
        .arg(
            Arg::new("markers")
                .required(true)
                .index(1)
                .help("Marker positions"),
        )
        .arg(
            Arg::new("traits")
                .required(true)
                .index(2)
                .help("Trait positions. [stdin] for standard input"),
        )
        .arg(super::outfile_arg())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let mut writer = slink::writer(args.get_one::<String>("outfile").unwrap())?;

    let markers = read_loci(slink::reader(args.get_one::<String>("markers").unwrap())?)?;
    let traits = read_loci(slink::reader(args.get_one::<String>("traits").unwrap())?)?;
    log::info!("{} markers, {} traits", markers.len(), traits.len());

    for (locus, marker) in traits.iter().zip(nearest_markers(&traits, &markers)) {
        writer.write_fmt(format_args!("{}\t{}\n", locus.name, marker.unwrap_or("NA")))?;
    }

    Ok(())
}
