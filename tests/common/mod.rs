#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` to `relative` under the workspace, creating parent
    /// directories as needed, and returns the full path.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write temp file contents");
        path
    }

    pub fn read(&self, relative: &str) -> String {
        let path = self.temp_dir.path().join(relative);
        fs::read_to_string(&path).unwrap_or_else(|err| panic!("read {path:?}: {err}"))
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.temp_dir.path().join(relative).exists()
    }
}

pub const OLD: &str = "old_version";
pub const NEW: &str = "new_version";

/// Two dataset versions exercising every kind of drift:
///
/// - `Invoices` renamed to `Invoice` (new path), `Receipts` added
/// - `clients` moved from `data/clients` to `crm/clients`
/// - `archive` removed, `notes` listed without a path
/// - `orders`: `customer_nm` renamed, `legacy_flag` dropped, `region` added
/// - scenarios: `baseline_2030` renamed, `B` removed, `D` added, rows reordered
/// - temporal: `load_mwh` renamed, `obsolete` dropped, `prices.csv` added
pub fn write_sample_dataset(ws: &TestWorkspace) -> (PathBuf, PathBuf) {
    ws.write(
        "old_version/csv_structure.csv",
        "table,path\norders,data/orders\nInvoices,billing/invoices\nclients,data/clients\narchive,legacy/archive\nnotes,\n",
    );
    ws.write(
        "old_version/data/orders/orders.csv",
        "id,customer_nm,legacy_flag,amount\n1,acme,y,10\n2,globex,n,20\n",
    );
    ws.write(
        "old_version/billing/invoices/invoices.csv",
        "invoice_id,total\nINV1,100\n",
    );
    ws.write("old_version/data/clients/clients.csv", "id,name\n1,acme\n");
    ws.write("old_version/legacy/archive/archive.csv", "x\n1\n");
    ws.write(
        "old_version/scenarios.csv",
        "scenario,growth\nA,1\nB,2\nC,3\nbaseline_2030,4\n",
    );
    ws.write(
        "old_version/temporal/2024/load.csv",
        "timestamp,load_mwh,obsolete\nt1,5,z\n",
    );
    ws.write(
        "old_version/temporal/2025/load.csv",
        "timestamp,load_mwh,obsolete\nt2,6,z\n",
    );

    ws.write(
        "new_version/csv_structure.csv",
        "table,path\norders,data/orders\nInvoice,billing/invoice\nclients,crm/clients\nReceipts,billing/receipts\n",
    );
    ws.write(
        "new_version/data/orders/orders.csv",
        "id,customer_name,amount,region\n9,initech,5,north\n",
    );
    ws.write(
        "new_version/billing/invoice/invoice.csv",
        "invoice_id,total,currency\n",
    );
    ws.write("new_version/crm/clients/clients.csv", "id,name\n");
    ws.write("new_version/billing/receipts/receipts.csv", "receipt_id\n");
    ws.write(
        "new_version/scenarios.csv",
        "scenario,growth\nC,30\nA,10\nD,40\nbaseline_2035,50\n",
    );
    ws.write(
        "new_version/temporal/2024/load.csv",
        "timestamp,load_mw,price\n",
    );
    ws.write("new_version/temporal/2024/prices.csv", "timestamp,price\n");
    ws.write("new_version/temporal/2030/load.csv", "other\n");

    (ws.path().join(OLD), ws.path().join(NEW))
}
