use clap::*;
use itertools::Itertools;
use slink::libs::heatmap::{heatmap_data, TraitTable};
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("heatmap")
        .about("Cluster traits and order them for a heatmap")
        .after_help(
            r###"
Aligns traits to a strain list, computes correlation distances, clusters
them with single linkage and writes the traits in leaf order.

Output formats (--format):
* wide: the trait table, rows in heatmap order, NA for missing values
* long: `trait<TAB>strain<TAB>value` for every present value, in heatmap order

Examples:
1. Ordered table:
   slink heatmap traits.tsv

2. Also save the clustering tree:
   slink heatmap traits.tsv --newick traits.nwk

3. Long format over selected strains:
   slink heatmap traits.tsv --strains strains.txt --format long

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
        .arg(
            Arg::new("format")
                .long("format")
                .num_args(1)
                .default_value("wide")
                .value_parser(["wide", "long"])
                .help("Output format"),
        )
        .arg(
            Arg::new("newick")
                .long("newick")
                .num_args(1)
                .help("Write the clustering tree to this file"),
        )
        .arg(super::outfile_arg())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let mut writer = slink::writer(args.get_one::<String>("outfile").unwrap())?;

    let infile = args.get_one::<String>("infile").unwrap();
    let table = TraitTable::from_tsv(slink::reader(infile)?)?;

    let strainlist = match args.get_one::<String>("strains") {
        Some(file) => Some(slink::read_first_column(file)?),
        None => None,
    };

    let data = heatmap_data(&table, strainlist.as_deref())?;
    log::debug!("Merge tree: {}", data.linkage.tree().to_nested());

    if let Some(file) = args.get_one::<String>("newick") {
        let mut tree_writer = slink::writer(file)?;
        tree_writer.write_all((data.linkage.to_newick(&data.trait_names) + "\n").as_ref())?;
    }

    match args.get_one::<String>("format").unwrap().as_str() {
        "wide" => {
            writer.write_fmt(format_args!("trait\t{}\n", data.strainlist.join("\t")))?;
            for &i in &data.order {
                let name = &data.trait_names[i];
                let values = table
                    .export_trait_data(name, &data.strainlist)
                    .unwrap_or_default();
                let cells = values
                    .iter()
                    .map(|v| match v {
                        Some(v) => v.to_string(),
                        None => "NA".to_string(),
                    })
                    .join("\t");
                writer.write_fmt(format_args!("{}\t{}\n", name, cells))?;
            }
        }
        "long" => {
            for row in &data.rows {
                let name = &data.trait_names[row.index];
                for (strain, value) in row.strains.iter().zip(row.values.iter()) {
                    writer.write_fmt(format_args!("{}\t{}\t{}\n", name, strain, value))?;
                }
            }
        }
        _ => unreachable!(),
    }

    Ok(())
}
