//! Table definitions for both backends
//!
//! The embedded engine runs [`EMBEDDED_DDL`] on every start. The hosted
//! service cannot accept DDL over its REST surface, so [`hosted_ddl`] is
//! exported for an operator to apply once.

use crate::entities::LookupKind;

/// Tables the repository expects, in creation order
pub const TABLES: &[&str] = &[
    "employees",
    "workcenters",
    "part_numbers",
    "customers",
    "inspection_items",
    "dmt_records",
    "audit_log",
];

/// Fixed-width UTC timestamp with milliseconds; sorts lexically
pub const SQLITE_NOW: &str = "strftime('%Y-%m-%d %H:%M:%f','now')";

pub const EMBEDDED_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS employees (
    id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
    name TEXT NOT NULL CHECK (length(name) > 0),
    email TEXT UNIQUE,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f','now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f','now'))
);

CREATE TABLE IF NOT EXISTS workcenters (
    id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
    name TEXT NOT NULL CHECK (length(name) > 0),
    code TEXT UNIQUE NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f','now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f','now'))
);

CREATE TABLE IF NOT EXISTS part_numbers (
    id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
    part_number TEXT UNIQUE NOT NULL CHECK (length(part_number) > 0),
    description TEXT NOT NULL DEFAULT '',
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f','now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f','now'))
);

CREATE TABLE IF NOT EXISTS customers (
    id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
    name TEXT NOT NULL CHECK (length(name) > 0),
    code TEXT UNIQUE NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f','now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f','now'))
);

CREATE TABLE IF NOT EXISTS inspection_items (
    id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
    name TEXT NOT NULL CHECK (length(name) > 0),
    description TEXT NOT NULL DEFAULT '',
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f','now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f','now'))
);

CREATE TABLE IF NOT EXISTS dmt_records (
    id TEXT PRIMARY KEY,
    workcenter_id TEXT REFERENCES workcenters(id),
    part_number_id TEXT REFERENCES part_numbers(id),
    operation TEXT NOT NULL DEFAULT '',
    employee_id TEXT REFERENCES employees(id),
    qty INTEGER NOT NULL DEFAULT 0,
    customer_id TEXT REFERENCES customers(id),
    shop_order TEXT NOT NULL DEFAULT '',
    serial_number TEXT NOT NULL DEFAULT '',
    inspection_item_id TEXT REFERENCES inspection_items(id),
    date TEXT DEFAULT (date('now')),
    prepared_by_id TEXT REFERENCES employees(id),
    defect_description TEXT NOT NULL,
    car_type TEXT NOT NULL DEFAULT 'dmt' CHECK (car_type IN ('dmt', 'ndmt')),
    car_cycle INTEGER NOT NULL DEFAULT 1,
    car_second_cycle_date TEXT,
    disposition_approved_date TEXT,
    disposition_approved_by_id TEXT REFERENCES employees(id),
    sdr_number TEXT NOT NULL DEFAULT '',
    sdr_approve_date TEXT,
    dmt_closed INTEGER NOT NULL DEFAULT 0,
    car_closed_date TEXT,
    is_return INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f','now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f','now'))
);

CREATE TABLE IF NOT EXISTS audit_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    action TEXT NOT NULL,
    changes TEXT,
    timestamp TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f','now'))
);

CREATE INDEX IF NOT EXISTS idx_employees_name ON employees(name);
CREATE INDEX IF NOT EXISTS idx_employees_active ON employees(is_active);
CREATE INDEX IF NOT EXISTS idx_workcenters_name ON workcenters(name);
CREATE INDEX IF NOT EXISTS idx_workcenters_code ON workcenters(code);
CREATE INDEX IF NOT EXISTS idx_workcenters_active ON workcenters(is_active);
CREATE INDEX IF NOT EXISTS idx_part_numbers_part_number ON part_numbers(part_number);
CREATE INDEX IF NOT EXISTS idx_part_numbers_active ON part_numbers(is_active);
CREATE INDEX IF NOT EXISTS idx_customers_name ON customers(name);
CREATE INDEX IF NOT EXISTS idx_customers_code ON customers(code);
CREATE INDEX IF NOT EXISTS idx_customers_active ON customers(is_active);
CREATE INDEX IF NOT EXISTS idx_inspection_items_name ON inspection_items(name);
CREATE INDEX IF NOT EXISTS idx_inspection_items_active ON inspection_items(is_active);
CREATE INDEX IF NOT EXISTS idx_dmt_records_date ON dmt_records(date);
CREATE INDEX IF NOT EXISTS idx_dmt_records_active ON dmt_records(is_active);
CREATE INDEX IF NOT EXISTS idx_audit_log_entity ON audit_log(entity_type, entity_id);
"#;

/// Postgres DDL for the hosted service. Foreign keys carry the constraint
/// names the embed hints refer to (`dmt_records_<column>_fkey`).
pub fn hosted_ddl() -> String {
    let mut ddl = String::from("-- qms hosted schema\n\n");

    for kind in LookupKind::all() {
        ddl.push_str(&hosted_lookup_table(*kind));
        ddl.push('\n');
    }

    ddl.push_str(
        r#"CREATE TABLE IF NOT EXISTS dmt_records (
    id TEXT PRIMARY KEY,
    workcenter_id TEXT,
    part_number_id TEXT,
    operation TEXT NOT NULL DEFAULT '',
    employee_id TEXT,
    qty INTEGER NOT NULL DEFAULT 0,
    customer_id TEXT,
    shop_order TEXT NOT NULL DEFAULT '',
    serial_number TEXT NOT NULL DEFAULT '',
    inspection_item_id TEXT,
    date DATE DEFAULT CURRENT_DATE,
    prepared_by_id TEXT,
    defect_description TEXT NOT NULL,
    car_type TEXT NOT NULL DEFAULT 'dmt' CHECK (car_type IN ('dmt', 'ndmt')),
    car_cycle INTEGER NOT NULL DEFAULT 1,
    car_second_cycle_date DATE,
    disposition_approved_date DATE,
    disposition_approved_by_id TEXT,
    sdr_number TEXT NOT NULL DEFAULT '',
    sdr_approve_date DATE,
    dmt_closed BOOLEAN NOT NULL DEFAULT false,
    car_closed_date DATE,
    is_return BOOLEAN NOT NULL DEFAULT false,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
"#,
    );

    let fks = dmt_foreign_keys();
    for (i, (column, table)) in fks.iter().enumerate() {
        let sep = if i + 1 == fks.len() { "" } else { "," };
        ddl.push_str(&format!(
            "    CONSTRAINT dmt_records_{column}_fkey FOREIGN KEY ({column}) REFERENCES {table}(id){sep}\n"
        ));
    }
    ddl.push_str(");\n\n");

    ddl.push_str(
        r#"CREATE TABLE IF NOT EXISTS audit_log (
    id BIGSERIAL PRIMARY KEY,
    entity_type TEXT NOT NULL,
    entity_id TEXT NOT NULL,
    action TEXT NOT NULL,
    changes JSONB,
    timestamp TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_dmt_records_date ON dmt_records(date);
CREATE INDEX IF NOT EXISTS idx_dmt_records_active ON dmt_records(is_active);
CREATE INDEX IF NOT EXISTS idx_audit_log_entity ON audit_log(entity_type, entity_id);
"#,
    );

    ddl
}

/// `(column, referenced table)` for each foreign key on `dmt_records`
pub fn dmt_foreign_keys() -> [(&'static str, &'static str); 7] {
    [
        ("workcenter_id", "workcenters"),
        ("part_number_id", "part_numbers"),
        ("employee_id", "employees"),
        ("customer_id", "customers"),
        ("inspection_item_id", "inspection_items"),
        ("prepared_by_id", "employees"),
        ("disposition_approved_by_id", "employees"),
    ]
}

fn hosted_lookup_table(kind: LookupKind) -> String {
    let table = kind.table();
    let label = kind.label_column();
    let label_unique = if kind == LookupKind::PartNumber {
        " UNIQUE"
    } else {
        ""
    };

    let mut columns = vec![
        "    id TEXT PRIMARY KEY DEFAULT replace(gen_random_uuid()::text, '-', '')".to_string(),
        format!("    {label} TEXT NOT NULL{label_unique} CHECK (length({label}) > 0)"),
    ];
    if let Some(secondary) = kind.secondary_column() {
        let not_null = if kind.secondary_required() {
            " NOT NULL"
        } else {
            ""
        };
        columns.push(format!("    {secondary} TEXT UNIQUE{not_null}"));
    }
    if kind.has_description() {
        columns.push("    description TEXT NOT NULL DEFAULT ''".to_string());
    }
    columns.push("    is_active BOOLEAN NOT NULL DEFAULT true".to_string());
    columns.push("    created_at TIMESTAMPTZ NOT NULL DEFAULT now()".to_string());
    columns.push("    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()".to_string());

    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\n{}\n);\nCREATE INDEX IF NOT EXISTS idx_{table}_{label} ON {table}({label});\nCREATE INDEX IF NOT EXISTS idx_{table}_active ON {table}(is_active);\n",
        columns.join(",\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_embedded_ddl_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(EMBEDDED_DDL).unwrap();
        conn.execute_batch(EMBEDDED_DDL).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count as usize, TABLES.len());
    }

    #[test]
    fn test_embedded_label_must_be_non_empty() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(EMBEDDED_DDL).unwrap();
        assert!(conn
            .execute("INSERT INTO employees (id, name) VALUES ('e1', '')", [])
            .is_err());
    }

    #[test]
    fn test_embedded_label_indexes_exist() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(EMBEDDED_DDL).unwrap();
        for index in [
            "idx_employees_name",
            "idx_workcenters_name",
            "idx_part_numbers_part_number",
            "idx_customers_name",
            "idx_inspection_items_name",
        ] {
            let found: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1",
                    [index],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(found, 1, "missing {index}");
        }
    }

    #[test]
    fn test_embedded_car_type_is_checked() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(EMBEDDED_DDL).unwrap();
        assert!(conn
            .execute(
                "INSERT INTO dmt_records (id, defect_description, car_type) VALUES ('d1', 'x', 'zzz')",
                [],
            )
            .is_err());
        conn.execute(
            "INSERT INTO dmt_records (id, defect_description, car_type) VALUES ('d2', 'x', 'ndmt')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn test_hosted_ddl_names_employee_constraints() {
        let ddl = hosted_ddl();
        for table in TABLES {
            assert!(ddl.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")));
        }
        assert!(ddl.contains("CONSTRAINT dmt_records_employee_id_fkey FOREIGN KEY (employee_id) REFERENCES employees(id)"));
        assert!(ddl.contains("CONSTRAINT dmt_records_prepared_by_id_fkey"));
        assert!(ddl.contains("CONSTRAINT dmt_records_disposition_approved_by_id_fkey"));
        assert!(ddl.contains("code TEXT UNIQUE NOT NULL"));
        assert!(ddl.contains("email TEXT UNIQUE,"));
    }
}
