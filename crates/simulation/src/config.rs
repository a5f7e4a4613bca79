/// World-pixel size of one map tile.
pub const TILE_SIZE: f32 = 32.0;

/// Fixed simulation rate. One tick = one `FixedUpdate` pass.
pub const SIM_HZ: f64 = 10.0;
