use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: impl ToString) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

/// Two-column table of model statistics
pub fn stats_table(stats: &crate::model::ModelStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("Classes", stats.classes);
    builder.add_row("Methods", stats.methods);
    builder.add_row("Declared", stats.declared);
    builder.add_row("Calls", stats.calls);
    builder.add_row("Instantiations", stats.instantiations);
    builder.add_row("Low confidence", stats.low_confidence);
    builder.add_row("Unscoped", stats.unscoped);
    builder.add_row("Routes", stats.routes);
    builder.add_row("Event configs", stats.configs);
    builder.build()
}
