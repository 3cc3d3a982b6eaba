use crate::table::Table;
use crate::{BatchError, Result};
use latentdist_core::Sex;

pub const NAME_COLUMN: &str = "name";
pub const SEX_COLUMN: &str = "sex";
pub const PEER_NAME_COLUMN: &str = "fname";

pub const U1_COLUMN: &str = "u1distance";
pub const U2_COLUMN: &str = "u2distance";
pub const PEER_COLUMN: &str = "fdistance";

/// The fields of one table row the batch cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRecord {
    pub name: String,
    /// Raw sex cell, `None` when missing
    pub sex: Option<String>,
    /// Raw peer cell, `None` when missing or when the table has no peer column
    pub fname: Option<String>,
}

impl ParticipantRecord {
    pub fn new(name: impl Into<String>, sex: Option<&str>, fname: Option<&str>) -> Self {
        Self {
            name: name.into(),
            sex: sex.map(str::to_string),
            fname: fname.map(str::to_string),
        }
    }

    pub fn category(&self) -> Option<Sex> {
        self.sex.as_deref().and_then(Sex::parse)
    }

    /// Peer identifier, if present and non-blank
    pub fn peer(&self) -> Option<&str> {
        self.fname
            .as_deref()
            .map(str::trim)
            .filter(|peer| !peer.is_empty())
    }
}

/// Participant records extracted from a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Records {
    pub records: Vec<ParticipantRecord>,
    /// Whether the table carries a peer column at all
    pub has_peer_column: bool,
}

impl Records {
    pub fn from_table(table: &Table) -> Result<Self> {
        let name = table
            .column(NAME_COLUMN)
            .ok_or_else(|| BatchError::MissingColumn(NAME_COLUMN.to_string()))?;
        let sex = table
            .column(SEX_COLUMN)
            .ok_or_else(|| BatchError::MissingColumn(SEX_COLUMN.to_string()))?;
        let peer = table.column(PEER_NAME_COLUMN);

        let records = (0..table.len())
            .map(|row| ParticipantRecord {
                name: table.cell(row, name).unwrap_or_default().trim().to_string(),
                sex: table.cell(row, sex).map(str::to_string),
                fname: peer.and_then(|col| table.cell(row, col)).map(str::to_string),
            })
            .collect();

        Ok(Self {
            records,
            has_peer_column: peer.is_some(),
        })
    }
}
