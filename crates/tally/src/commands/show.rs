//! `tally show`: one page of aggregated records.
//!
//! Drives the controller the way an interactive view would: wait for the
//! initial load, replay the flags as intents, wait for the pipeline to
//! settle, render.

use tally_core::{AggregationController, AggregationState, PageEvent};
use tracing::debug;

use crate::cli::{GlobalOpts, ShowArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: ShowArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let resolved = config::resolve(global)?;
    let controller = AggregationController::from_config(&resolved.aggregation)?;

    let result = load(&controller, &args).await;
    controller.shutdown().await;
    let state = result?;

    if let Some(message) = state.error() {
        return Err(CliError::LoadFailed {
            message: message.to_owned(),
        });
    }

    let rendered = output::render_state(resolved.output, &state)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

async fn load(
    controller: &AggregationController,
    args: &ShowArgs,
) -> Result<AggregationState, CliError> {
    controller.settled().await?;

    // Toggles and sort reset to page 0, and a size change wins over
    // navigation, so the page is replayed last, against settled totals.
    let mut replayed = false;
    for field in &args.group_by {
        if !controller.is_field_selected(*field) {
            controller.toggle_field(*field);
            replayed = true;
        }
    }
    if let Some(sort) = args.sort {
        controller.set_sort(Some(sort));
        replayed = true;
    }
    if let Some(size) = args.size.filter(|s| *s != controller.page_size()) {
        controller.handle_page_event(PageEvent {
            page_index: 0,
            page_size: size,
        });
        replayed = true;
    }
    if replayed {
        debug!(requests = controller.state().requested(), "replayed intents");
    }
    let state = controller.settled().await?;

    let Some(page) = args.page.filter(|p| *p != state.current_page()) else {
        return Ok(state);
    };
    if state.error().is_some() {
        return Ok(state);
    }
    if page >= state.total_pages() {
        return Err(CliError::Validation {
            field: "page".into(),
            reason: format!(
                "page {page} is beyond the {} available at {} per page",
                state.total_pages(),
                state.page_size()
            ),
        });
    }
    controller.handle_page_event(PageEvent {
        page_index: page,
        page_size: state.page_size(),
    });
    debug!(page, "replayed page");
    Ok(controller.settled().await?)
}
