use anyhow::Result;

use super::util::open_store;

pub fn exec(store_url: String, container: String, prefix: Option<String>, json: bool) -> Result<()> {
    let store = open_store(&store_url)?;
    let keys = store.list(&container, prefix.as_deref().unwrap_or(""))?;

    if json {
        println!("{}", serde_json::to_string(&keys)?);
        return Ok(());
    }

    if keys.is_empty() {
        println!("(no objects)");
        return Ok(());
    }
    for k in keys {
        println!("{k}");
    }
    Ok(())
}
