// src/render/helpers.rs
use handlebars::{handlebars_helper, Handlebars};

// {{money 1600}} -> "1600.00"
handlebars_helper!(money: |amount: f64| format!("{:.2}", amount));

// {{pad item_name max_len}} left-aligns text in a column of `width` characters.
handlebars_helper!(pad: |text: str, width: u64| {
    format!("{:<width$}", text, width = width as usize)
});

/// Registers the report helpers on a template registry.
pub fn register_helpers(registry: &mut Handlebars<'_>) {
    registry.register_helper("money", Box::new(money));
    registry.register_helper("pad", Box::new(pad));
}
