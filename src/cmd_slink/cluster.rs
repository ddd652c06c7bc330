use clap::*;
use slink::libs::linkage::slink;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("cluster")
        .about("Single-linkage clustering of a distance matrix")
        .after_help(
            r###"
Agglomerates the closest pair of clusters until one remains. The distance
between clusters is the minimum distance between their members.

Output formats (--format):
* newick: Newick tree, branch lengths from merge heights
* nested: nested pairs of 0-based indices, e.g. ((0,(2,4)),(1,3))
* merges: one line per merge: left, right, height, size.
          Items are 0..N-1, the k-th merge creates cluster N+k
* order:  item names from left to right

With --cut, prints `name<TAB>cluster` for the flat clusters obtained by
applying merges no higher than the threshold.

Examples:
1. Newick tree:
   slink cluster matrix.phy

2. Leaf order:
   slink cluster matrix.phy --format order

3. Flat clusters at distance 0.5:
   slink cluster matrix.phy --cut 0.5

"###,
        );

    super::matrix_args(cmd)
        .arg(
            Arg::new("format")
                .long("format")
                .num_args(1)
                .default_value("newick")
                .value_parser(["newick", "nested", "merges", "order"])
                .help("Output format"),
        )
        .arg(
            Arg::new("cut")
                .long("cut")
                .num_args(1)
                .value_parser(value_parser!(f64))
                .help("Report flat clusters at this height"),
        )
        .arg(super::outfile_arg())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    if let Some(threshold) = args.get_one::<f64>("cut") {
        if threshold.is_nan() || *threshold < 0.0 {
            anyhow::bail!("--cut must be a non-negative distance, got {}", threshold);
        }
    }

    let mut writer = slink::writer(args.get_one::<String>("outfile").unwrap())?;

    let matrix = super::load_matrix(args)?;
    let names = matrix.names();
    let linkage = slink(&matrix);

    if let Some(threshold) = args.get_one::<f64>("cut") {
        for (name, label) in names.iter().zip(linkage.cut(*threshold)) {
            writer.write_fmt(format_args!("{}\t{}\n", name, label))?;
        }
        return Ok(());
    }

    match args.get_one::<String>("format").unwrap().as_str() {
        "newick" => {
            writer.write_all((linkage.to_newick(names) + "\n").as_ref())?;
        }
        "nested" => {
            writer.write_all((linkage.tree().to_nested() + "\n").as_ref())?;
        }
        "merges" => {
            for step in linkage.steps() {
                writer.write_fmt(format_args!(
                    "{}\t{}\t{}\t{}\n",
                    step.left, step.right, step.height, step.size
                ))?;
            }
        }
        "order" => {
            for i in linkage.order() {
                writer.write_fmt(format_args!("{}\n", names[i]))?;
            }
        }
        _ => unreachable!(),
    }

    Ok(())
}
