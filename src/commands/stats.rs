use docstore::Backend;

use crate::store::Newsroom;

pub(crate) fn cmd_stats<B: Backend>(room: &mut Newsroom<B>, bump: bool) -> anyhow::Result<()> {
    if bump {
        room.record_visit()?;
    }
    println!("Visits: {}", room.stats.visits);
    if room.stats.last_updated.is_empty() {
        println!("Last updated: never");
    } else {
        println!("Last updated: {}", room.stats.last_updated);
    }
    Ok(())
}
