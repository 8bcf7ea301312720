//! Footprint input keyed by tile name.

use std::collections::BTreeMap;
use std::io::Read;

use crate::error::Result;
use crate::footprint::FootprintRecord;

/// Bleed-trail records per coadd tile.
pub type TileFootprints = BTreeMap<String, Vec<FootprintRecord>>;

/// Parse `{ "<tile>": [record, ...], ... }`.
pub fn read_tile_footprints<R: Read>(reader: R) -> Result<TileFootprints> {
    Ok(serde_json::from_reader(reader)?)
}
