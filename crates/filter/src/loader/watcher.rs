//! Filesystem event handler for the notify watcher (hot-reload).

use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind};
use tracing::{info, warn};

use super::core::{apply_file, is_config_file, is_dotfile, remove_path, Applied, PlanMap};

/// Handle a single filesystem event from the notify watcher.
pub(super) fn handle_fs_event(event: &Event, plans: &PlanMap) {
    for path in &event.paths {
        // Dotfiles include in-progress `.tmp` writes.
        if !is_config_file(path) || is_dotfile(path) {
            continue;
        }

        match &event.kind {
            EventKind::Create(CreateKind::File)
            | EventKind::Create(CreateKind::Any)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Any)
            | EventKind::Modify(ModifyKind::Name(_)) => {
                if !path.exists() {
                    // Rename away from this path.
                    for id in remove_path(plans, path) {
                        info!(plan_id = %id, path = %path.display(), "removed filter plan after rename");
                    }
                    continue;
                }
                match apply_file(plans, path) {
                    Ok(Applied::Installed(id)) => {
                        info!(plan_id = %id, path = %path.display(), "hot-reloaded filter plan");
                    }
                    Ok(Applied::Disabled(id)) => {
                        info!(plan_id = %id, path = %path.display(), "filter config disabled, plan withdrawn");
                    }
                    Err(e) => {
                        warn!(
                            path = %path.display(),
                            error = %e,
                            "failed to reload filter config, keeping previous plan"
                        );
                    }
                }
            }
            EventKind::Remove(RemoveKind::File) | EventKind::Remove(RemoveKind::Any) => {
                for id in remove_path(plans, path) {
                    info!(plan_id = %id, path = %path.display(), "removed filter plan after file deletion");
                }
            }
            _ => {}
        }
    }
}
