// ── Action dispatch ──
//
// Resolves (button, mode) to the configured mappings and executes them
// against the collaborators. Selection policy: every mapping whose
// selector exactly matches the current mode runs; only when no exact
// match exists do the `any` mappings run. Exact matches are never
// skipped in favor of `any`.

use tracing::{debug, warn};

use crate::collaborators::Collaborators;
use crate::model::{BulbAction, ButtonAction, ButtonMapping, LedColor, Mode};

/// Select the mappings to run for a button at a given mode.
pub fn select_mappings<'a>(
    mappings: &'a [ButtonMapping],
    button: u8,
    mode: Mode,
) -> Vec<&'a ButtonMapping> {
    let for_button: Vec<&ButtonMapping> =
        mappings.iter().filter(|m| m.button == button).collect();

    let exact: Vec<&ButtonMapping> = for_button
        .iter()
        .copied()
        .filter(|m| m.mode.matches_exactly(mode))
        .collect();
    if !exact.is_empty() {
        return exact;
    }

    for_button.into_iter().filter(|m| m.mode.is_any()).collect()
}

/// Execute one mapping's action.
///
/// Collaborator failures are logged per target and never abort sibling
/// targets. A `Led` action is not executed here: the new color is
/// returned for the caller, which owns LED state and the device link.
pub async fn run_mapping(
    mapping: &ButtonMapping,
    collaborators: &Collaborators,
) -> Option<LedColor> {
    match &mapping.action {
        ButtonAction::Bulb {
            action,
            targets,
            brightness,
        } => {
            for target in targets {
                let result = match action {
                    BulbAction::On => collaborators.bulbs.turn_on(target).await,
                    BulbAction::Off => collaborators.bulbs.turn_off(target).await,
                    BulbAction::Brightness => match brightness {
                        Some(level) => {
                            collaborators.bulbs.set_brightness(target, *level).await
                        }
                        None => {
                            warn!(light = %target, "brightness mapping has no level, skipping");
                            continue;
                        }
                    },
                };
                if let Err(e) = result {
                    warn!(light = %target, error = %e, "bulb action failed");
                }
            }
            None
        }

        ButtonAction::Accessory { target, action } => {
            if let Err(e) = collaborators.accessory.set_switch(target, *action).await {
                warn!(switch = %target, error = %e, "accessory action failed");
            }
            None
        }

        ButtonAction::Scene { name } => {
            if let Err(e) = collaborators.scenes.run_scene(name).await {
                warn!(scene = %name, error = %e, "scene trigger failed");
            }
            None
        }

        ButtonAction::Led { color } => {
            debug!(color = %color, "mapping sets panel LED");
            Some(color.palette_color())
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
