//! Filament matching.
//!
//! A tray only reports a sub-brand label such as `PLA Basic` and a color.
//! External catalog ids look like `bambulab_pla_basic_orange_1750_1000`, so
//! the label is turned into id prefixes of decreasing specificity and the
//! color picks the entry among those sharing a prefix.

use spoolbridge_catalog::{ExternalFilament, InternalFilament};
use spoolbridge_core::{TraySnapshot, constants::EXTERNAL_ID_PREFIX};

/// Id prefixes tried for a sub-brand label, most specific first.
///
/// # Examples
///
/// ```
/// use spoolbridge_engine::candidate_prefixes;
///
/// assert_eq!(
///     candidate_prefixes("PolyTerra Matte"),
///     [
///         "bambulab_polyterra matte",
///         "bambulab_polyterra_matte",
///         "bambulab_polyterra",
///     ]
/// );
/// ```
#[must_use]
pub fn candidate_prefixes(sub_brand: &str) -> [String; 3] {
    let label = sub_brand.to_lowercase();
    let first_word = label.split(' ').next().unwrap_or_default();

    [
        format!("{EXTERNAL_ID_PREFIX}{label}"),
        format!("{EXTERNAL_ID_PREFIX}{}", label.replace(' ', "_")),
        format!("{EXTERNAL_ID_PREFIX}{first_word}"),
    ]
}

/// Find the external catalog entry for a tray.
///
/// Prefixes are tried in order and the catalog is scanned in order for each,
/// so an entry under a more specific prefix always wins. Multi-color entries
/// (no single `color_hex`) never match.
#[must_use]
pub fn match_external<'a>(
    catalog: &'a [ExternalFilament],
    tray: &TraySnapshot,
) -> Option<&'a ExternalFilament> {
    candidate_prefixes(&tray.sub_brand)
        .iter()
        .find_map(|prefix| {
            catalog.iter().find(|filament| {
                filament.id.starts_with(prefix.as_str())
                    && filament
                        .color_hex
                        .as_deref()
                        .is_some_and(|hex| tray.color.matches_hex(hex))
            })
        })
}

/// Internal filament types created from `external`, in catalog order.
#[must_use]
pub fn match_internal<'a>(
    catalog: &'a [InternalFilament],
    external: &ExternalFilament,
) -> Vec<&'a InternalFilament> {
    catalog
        .iter()
        .filter(|filament| filament.external_id.as_deref() == Some(external.id.as_str()))
        .collect()
}
