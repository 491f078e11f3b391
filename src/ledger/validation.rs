use std::collections::BTreeSet;

use super::error::{invalid, LedgerError};
use crate::{
    models::{
        types::{Division, LocalDateTime, PlayerName},
        NewProposal, ProposalDraft,
    },
    parsing::{normalize_date, normalize_time},
};

fn required(value: &str, field: &'static str) -> Result<String, LedgerError> {
    let value = value.trim();
    if value.is_empty() {
        Err(invalid(field))
    } else {
        Ok(value.to_owned())
    }
}

/// Checks a submitted proposal for the fields a half-filled form tends to leave out.
///
/// The date and time are normalized on a best-effort basis: a non-empty date that doesn't
/// parse is stored as written.
pub fn validate(new: &NewProposal, now: LocalDateTime) -> Result<ProposalDraft, LedgerError> {
    let sender_name = PlayerName::new(required(&new.sender_name, "sender_name")?);
    let sender_email = required(&new.sender_email, "sender_email")?;
    let receiver_name = PlayerName::new(required(&new.receiver_name, "receiver_name")?);
    let receiver_email = required(&new.receiver_email, "receiver_email")?;
    let date = normalize_date(&required(&new.date, "date")?);
    let location = required(&new.location, "location")?;
    let phase = new.phase.ok_or(invalid("phase"))?;

    if sender_name == receiver_name {
        return Err(invalid("receiver_name"));
    }

    let divisions: BTreeSet<Division> = new
        .divisions
        .iter()
        .map(Division::new)
        .filter(|division| !division.is_blank())
        .collect();
    if divisions.is_empty() {
        return Err(invalid("divisions"));
    }

    Ok(ProposalDraft {
        sender_name,
        sender_email,
        receiver_name,
        receiver_email,
        divisions,
        phase,
        date,
        time: normalize_time(&new.time),
        location,
        game_type: new.game_type.trim().to_owned(),
        race_length: new.race_length,
        note: new.note.trim().to_owned(),
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use super::validate;
    use crate::{
        ledger::LedgerError,
        models::{NewProposal, Phase},
        parsing::CalendarDate,
    };

    fn complete() -> NewProposal {
        NewProposal {
            sender_name: "Pat Quinn".to_string(),
            sender_email: "pat@example.com".to_string(),
            receiver_name: "Ann Lee".to_string(),
            receiver_email: "ann@example.com".to_string(),
            divisions: vec!["Monday 8-Ball".to_string()],
            phase: Some(Phase::Scheduled),
            date: "3/4/2024".to_string(),
            time: "7pm".to_string(),
            location: "Corner Pocket".to_string(),
            game_type: "8 Ball".to_string(),
            race_length: Some(5),
            note: String::new(),
        }
    }

    fn missing_field(new: NewProposal) -> &'static str {
        match validate(&new, datetime!(2024-03-01 12:00).into()) {
            Err(LedgerError::Validation { field }) => field,
            other => panic!("Expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_complete_proposal() {
        let draft = validate(&complete(), datetime!(2024-03-01 12:00).into()).unwrap();

        assert_eq!(draft.date, CalendarDate::Date(date!(2024 - 03 - 04)));
        assert_eq!(draft.divisions.len(), 1);
    }

    #[test]
    fn rejects_missing_emails() {
        assert_eq!(
            missing_field(NewProposal {
                sender_email: "  ".to_string(),
                ..complete()
            }),
            "sender_email"
        );
        assert_eq!(
            missing_field(NewProposal {
                receiver_email: String::new(),
                ..complete()
            }),
            "receiver_email"
        );
    }

    #[test]
    fn rejects_missing_date_location_phase() {
        assert_eq!(
            missing_field(NewProposal {
                date: String::new(),
                ..complete()
            }),
            "date"
        );
        assert_eq!(
            missing_field(NewProposal {
                location: " ".to_string(),
                ..complete()
            }),
            "location"
        );
        assert_eq!(
            missing_field(NewProposal {
                phase: None,
                ..complete()
            }),
            "phase"
        );
    }

    #[test]
    fn rejects_self_match_and_missing_divisions() {
        assert_eq!(
            missing_field(NewProposal {
                receiver_name: "pat quinn ".to_string(),
                ..complete()
            }),
            "receiver_name"
        );
        assert_eq!(
            missing_field(NewProposal {
                divisions: vec![" ".to_string()],
                ..complete()
            }),
            "divisions"
        );
    }

    #[test]
    fn unparseable_date_is_kept() {
        let draft = validate(
            &NewProposal {
                date: "Saturday".to_string(),
                ..complete()
            },
            datetime!(2024-03-01 12:00).into(),
        )
        .unwrap();

        assert_eq!(draft.date, CalendarDate::Unparsed("Saturday".to_string()));
    }
}
