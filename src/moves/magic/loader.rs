//! Magic table bootstrap. By default the tables are regenerated from a fixed
//! seed (deterministic, well under a second) and cached for the process
//! lifetime. The `load_magic` feature reads a bincode snapshot first and
//! falls back to regeneration.

use crate::moves::magic::precompute::{MagicTableSeed, generate_magic_tables};
use crate::moves::magic::structs::MagicTables;
use once_cell::sync::OnceCell;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub const MAGIC_SNAPSHOT_FILE: &str = "magic_tables.bin";

const MAGIC_SEED: u64 = 0xC0DE_D00D_5EED_0001;

fn build_tables() -> MagicTables {
    #[cfg(feature = "load_magic")]
    {
        match read_magic_tables(MAGIC_SNAPSHOT_FILE) {
            Ok(tables) => return tables,
            Err(e) => tracing::warn!("magic snapshot unreadable ({}), regenerating", e),
        }
    }

    generate_magic_tables(MagicTableSeed::Fixed(MAGIC_SEED))
        .expect("magic table generation failed")
}

/// Tables are generated once per process and cached; callers receive their
/// own copy so ownership stays simple at call sites.
pub fn load_magic_tables() -> MagicTables {
    static TABLES: OnceCell<MagicTables> = OnceCell::new();
    TABLES.get_or_init(build_tables).clone()
}

pub fn read_magic_tables<P: AsRef<Path>>(path: P) -> Result<MagicTables, String> {
    let file = File::open(path.as_ref()).map_err(|e| e.to_string())?;
    bincode::deserialize_from(BufReader::new(file)).map_err(|e| e.to_string())
}

pub fn save_magic_tables<P: AsRef<Path>>(tables: &MagicTables, path: P) -> Result<(), String> {
    let file = File::create(path.as_ref()).map_err(|e| e.to_string())?;
    bincode::serialize_into(BufWriter::new(file), tables).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_round_trip() {
        let tables = load_magic_tables();
        let path = std::env::temp_dir().join("ember_magic_snapshot_test.bin");
        save_magic_tables(&tables, &path).unwrap();
        let restored = read_magic_tables(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        for sq in 0..64 {
            assert_eq!(tables.rook.entries[sq], restored.rook.entries[sq]);
            assert_eq!(tables.bishop.entries[sq], restored.bishop.entries[sq]);
        }
    }
}
