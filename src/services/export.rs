use crate::models::{report::ClubSeasonSummary, season::Season};

const CLUB_HEADERS: [&str; 9] = [
    "ID", "Name", "SR ID", "Contact", "Email", "Skiers", "Coaches", "PTSO", "Status",
];

/// `clubs_2024-2025.csv`
pub fn clubs_filename(season: Season) -> String {
    format!("clubs_{}-{}.csv", season.start_year(), season.end_year())
}

pub fn clubs_csv(rows: &[ClubSeasonSummary]) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CLUB_HEADERS)?;
    for r in rows {
        writer.write_record([
            r.club_id.to_string(),
            r.club_name.clone(),
            r.sr_id.to_string(),
            r.primary_contact.clone(),
            r.primary_contact_email.clone(),
            r.counts.skiers.to_string(),
            r.counts.coaches.to_string(),
            r.ptso.clone().unwrap_or_default(),
            r.status.to_string(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to finish CSV export: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::{ClubStatus, Counts};

    #[test]
    fn filename_uses_dash_between_years() {
        assert_eq!(clubs_filename(Season::starting(2024)), "clubs_2024-2025.csv");
    }

    #[test]
    fn writes_header_and_quotes_commas() {
        let rows = vec![ClubSeasonSummary {
            club_id: 42,
            season: Season::starting(2024),
            club_name: "Mont-Tremblant, Ski Club".into(),
            sr_id: 42,
            ptso: Some("QC".into()),
            counts: Counts { coaches: 3, skiers: 25, ..Default::default() },
            primary_contact: "Ana Roy".into(),
            primary_contact_email: "ana@example.org".into(),
            status: ClubStatus::Active,
        }];
        let out = String::from_utf8(clubs_csv(&rows).unwrap()).unwrap();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("ID,Name,SR ID,Contact,Email,Skiers,Coaches,PTSO,Status"));
        assert_eq!(
            lines.next(),
            Some("42,\"Mont-Tremblant, Ski Club\",42,Ana Roy,ana@example.org,25,3,QC,Active")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_table_is_header_only() {
        let out = String::from_utf8(clubs_csv(&[]).unwrap()).unwrap();
        assert_eq!(out, "ID,Name,SR ID,Contact,Email,Skiers,Coaches,PTSO,Status\n");
    }
}
