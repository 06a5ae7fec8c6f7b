use dialog_nlqp::MemoryStore;

/// A small knowledge graph: planets and their moons, employees and their
/// department, pets and their lengths.
pub fn world() -> anyhow::Result<MemoryStore> {
    Ok(MemoryStore::from_json(include_str!("../fixtures/world.json"))?)
}
