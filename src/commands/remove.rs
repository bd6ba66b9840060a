use docstore::Backend;

use crate::store::Newsroom;

pub(crate) fn cmd_remove<B: Backend>(room: &mut Newsroom<B>, name: &str) -> anyhow::Result<()> {
    let removed = room.remove_feed(name)?;
    if removed == 1 {
        eprintln!("Removed feed {name}.");
    } else {
        eprintln!("Removed {removed} feeds named {name}.");
    }
    Ok(())
}
