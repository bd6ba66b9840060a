use docstore::Backend;

use crate::store::Newsroom;

pub(crate) fn cmd_add<B: Backend>(
    room: &mut Newsroom<B>,
    name: &str,
    url: &str,
) -> anyhow::Result<()> {
    room.add_feed(name, url)?;
    eprintln!("Added feed {}.", name.trim());
    Ok(())
}
