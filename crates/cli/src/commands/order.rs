
use clap::Args;
use guidepost_agent::OrderScreen;
use guidepost_core::domain::money::format_money;

use crate::commands::{CommandResult, Context};
use crate::GlobalArgs;

#[derive(Clone, Debug, Default, Args)]
pub struct OrderArgs {
    #[arg(help = "Chat commands, e.g. \"switch shipment to courier\"")]
    pub commands: Vec<String>,
    #[arg(long, help = "Item number to highlight, as the ?highlight= link does")]
    pub highlight: Option<String>,
}

pub fn run(global: &GlobalArgs, args: &OrderArgs) -> CommandResult {
    let context = match Context::load("order", global) {
        Ok(context) => context,
        Err(failure) => return failure,
    };
    let runtime = match context.runtime() {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let output = runtime.block_on(async {
        let highlight_clear = context.pacing().highlight_clear;
        let mut screen = OrderScreen::new(context.fixtures.sales_order.clone(), highlight_clear)
            .with_highlighted_line(args.highlight.as_deref());

        let mut lines = Vec::new();
        for command in &args.commands {
            let change = screen.submit(command);
            lines.push(format!("> {command}"));
            if let Some(reply) = screen.messages().last() {
                lines.push(reply.content.clone());
            }
            if let Some(field) = change.and_then(|_| screen.highlighted()) {
                lines.push(format!("(highlighting {} for {} ms)", field.label(), highlight_clear.as_millis()));
            }
        }
        lines.push(String::new());
        lines.extend(render_order(&screen));
        lines.join("\n")
    });

    CommandResult::report(output)
}

fn render_order(screen: &OrderScreen) -> Vec<String> {
    let order = screen.order();
    let metadata = screen.metadata();
    let mut lines = vec![
        format!("Sales Order {} ({}) for {}", order.number, order.status, order.customer_name),
        format!("  Shipment Method Code: {}", metadata.shipment_method.code()),
        format!("  Load-in Time: {}", metadata.load_in_time),
        format!("  Location Code: {}", metadata.location_code),
        format!("  Requested Delivery: {}", metadata.requested_delivery_date.format("%Y-%m-%d")),
    ];
    for line in &order.lines {
        let marker = if screen.highlighted_line() == Some(line.no.as_str()) { "*" } else { " " };
        lines.push(format!(
            " {marker} {:>6} {:<14} {:>4} {}  {}",
            line.line_no,
            line.no,
            line.quantity,
            line.description,
            format_money(line.line_amount())
        ));
    }
    lines.push(format!(
        "  Subtotal {}  Tax {}  Total {}",
        format_money(order.subtotal()),
        format_money(order.tax()),
        format_money(order.total())
    ));
    lines
}
