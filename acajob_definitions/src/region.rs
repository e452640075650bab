/// Region used when the environment's location cannot be read
pub const DEFAULT_LOCATION: &str = "eastus";

/// Canonical region name
///
/// The resource manager hands out display names ("East US") but rejects them on PUT.
pub fn normalize_location(loc: &str) -> String {
    loc.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
