use std::env;

use anyhow::Context;
use kifu::Kif;

/// Opens a KIF record and prints the position reached by replaying it:
/// `kifu <record.kif> [branch] [ply-limit]`.
fn main() -> anyhow::Result<()> {
    let mut args = env::args().skip(1);
    let path = args
        .next()
        .context("usage: kifu <record.kif> [branch] [ply-limit]")?;
    let branch = match args.next() {
        Some(branch) => branch.parse().context("branch should be a number")?,
        None => 0,
    };
    let ply_limit = match args.next() {
        Some(limit) => Some(limit.parse().context("ply limit should be a number")?),
        None => None,
    };
    let record = Kif::open(&path)?;
    println!("{}", record.replay(branch, ply_limit));
    Ok(())
}
