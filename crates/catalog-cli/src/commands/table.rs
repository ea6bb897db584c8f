use catalog_client::{HealthState, QueryMeta, ServiceEntry};
use comfy_table::{Cell, Color, Table};

pub fn entries(entries: &[ServiceEntry]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "SERVICE", "ADDRESS", "NODE", "TAGS", "HEALTH"]);

    for entry in entries {
        let (health, color) = match entry.status {
            Some(HealthState::Passing) => ("passing", Color::Green),
            Some(HealthState::Warning) => ("warning", Color::Yellow),
            Some(HealthState::Critical) => ("critical", Color::Red),
            Some(HealthState::Maintenance) => ("maintenance", Color::DarkGrey),
            None => ("-", Color::DarkGrey),
        };

        table.add_row(vec![
            Cell::new(&entry.service_id),
            Cell::new(&entry.service_name),
            Cell::new(entry.socket_addr_string()),
            Cell::new(entry.node.as_deref().unwrap_or("-")),
            Cell::new(entry.tags.join(",")),
            Cell::new(health).fg(color),
        ]);
    }

    table
}

pub fn meta_line(meta: &QueryMeta) -> String {
    let index = meta
        .index
        .map(|i| i.to_string())
        .unwrap_or_else(|| "-".to_string());
    let leader = match meta.known_leader {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    };
    let contact = meta
        .last_contact
        .map(|d| format!("{}ms", d.as_millis()))
        .unwrap_or_else(|| "-".to_string());
    format!("index: {}  known leader: {}  last contact: {}", index, leader, contact)
}
