/// Metrics aggregator
///
/// Board statistics derived from the current cards and the full move
/// history. [`compute`] is a pure function over loaded rows; [`compute_metrics`]
/// loads those rows from one consistent snapshot and evaluates them against
/// the server's local calendar.
///
/// Durations are computed in milliseconds and reported in whole hours,
/// rounded half-up. Cards are classified by the role of their column, so
/// renaming a column never changes what counts as completed.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::error::KanbanError;
use crate::db::pool::begin_snapshot;
use crate::models::board::Board;
use crate::models::card::Card;
use crate::models::card_history::CardHistory;
use crate::models::column::{Column, ColumnRole};
use crate::models::user::{User, UserSummary};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Days covered by `completed_by_day`, today included
pub const COMPLETED_WINDOW_DAYS: i64 = 7;

/// Card count of one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCount {
    pub name: String,
    pub count: i64,
}

/// Average time cards spent in a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDuration {
    pub column: String,
    pub hours: i64,
}

/// Cards completed on one local calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: i64,
}

/// Per-assignee statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProductivity {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub cards_created: i64,
    pub cards_completed: i64,
    pub cards_in_progress: i64,

    /// Average hours from first to last recorded move of completed cards
    pub average_time_to_complete: i64,
}

/// Board statistics at one point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_cards: i64,
    pub cards_by_column: Vec<ColumnCount>,
    pub overdue_count: i64,
    pub due_today_count: i64,
    pub completed_count: i64,
    pub avg_time_by_column: Vec<ColumnDuration>,
    pub completed_by_day: Vec<DayCount>,
    pub member_productivity: Vec<MemberProductivity>,
}

/// Rows the metrics are computed from
#[derive(Debug, Clone, Copy)]
pub struct MetricsInput<'a> {
    /// The board's columns, in any order
    pub columns: &'a [Column],

    /// Every card in those columns
    pub cards: &'a [Card],

    /// Every history record of those cards, in any order
    pub history: &'a [CardHistory],

    /// Profiles of the cards' assignees
    pub users: &'a [UserSummary],
}

/// Rounds a millisecond duration to whole hours, half-up
fn millis_to_hours(millis: f64) -> i64 {
    (millis / MILLIS_PER_HOUR + 0.5).floor() as i64
}

/// Computes board statistics as of `now`
///
/// "Today" and the day boundaries of `completed_by_day` are taken in `now`'s
/// time zone.
pub fn compute<Tz: TimeZone>(input: MetricsInput<'_>, now: DateTime<Tz>) -> MetricsSnapshot {
    let tz = now.timezone();
    let today = now.date_naive();

    let mut columns: Vec<&Column> = input.columns.iter().collect();
    columns.sort_by_key(|c| c.position);

    let roles: HashMap<Uuid, ColumnRole> = columns.iter().map(|c| (c.id, c.role)).collect();
    let role_of = |card: &Card| roles.get(&card.column_id).copied().unwrap_or_default();

    let mut history_by_card: HashMap<Uuid, Vec<&CardHistory>> = HashMap::new();
    for entry in input.history {
        history_by_card.entry(entry.card_id).or_default().push(entry);
    }
    for entries in history_by_card.values_mut() {
        entries.sort_by(|a, b| a.moved_at.cmp(&b.moved_at).then(a.id.cmp(&b.id)));
    }

    let cards_by_column = columns
        .iter()
        .map(|column| ColumnCount {
            name: column.name.clone(),
            count: input
                .cards
                .iter()
                .filter(|card| card.column_id == column.id)
                .count() as i64,
        })
        .collect();

    let mut overdue_count = 0;
    let mut due_today_count = 0;
    let mut completed_count = 0;
    let window_start = today - Duration::days(COMPLETED_WINDOW_DAYS - 1);
    let mut completed_days: BTreeMap<NaiveDate, i64> = BTreeMap::new();

    for card in input.cards {
        if role_of(card) == ColumnRole::Done {
            completed_count += 1;

            let day = card.updated_at.with_timezone(&tz).date_naive();
            if day >= window_start && day <= today {
                *completed_days.entry(day).or_default() += 1;
            }
        } else if let Some(due) = card.due_date {
            if due < today {
                overdue_count += 1;
            } else if due == today {
                due_today_count += 1;
            }
        }
    }

    MetricsSnapshot {
        total_cards: input.cards.len() as i64,
        cards_by_column,
        overdue_count,
        due_today_count,
        completed_count,
        avg_time_by_column: average_time_by_column(&columns, &history_by_card),
        completed_by_day: completed_days
            .into_iter()
            .map(|(date, count)| DayCount { date, count })
            .collect(),
        member_productivity: member_productivity(input, &role_of, &history_by_card),
    }
}

fn average_time_by_column(
    columns: &[&Column],
    history_by_card: &HashMap<Uuid, Vec<&CardHistory>>,
) -> Vec<ColumnDuration> {
    // column name -> (total millis, intervals)
    let mut totals: HashMap<&str, (i64, i64)> = HashMap::new();

    for entries in history_by_card.values() {
        for pair in entries.windows(2) {
            let spent = pair[1].moved_at - pair[0].moved_at;
            let total = totals.entry(pair[0].to_column.as_str()).or_default();
            total.0 += spent.num_milliseconds();
            total.1 += 1;
        }
    }

    let average = |name: &str, (millis, intervals): (i64, i64)| ColumnDuration {
        column: name.to_string(),
        hours: millis_to_hours(millis as f64 / intervals as f64),
    };

    let mut result = Vec::with_capacity(totals.len());
    for column in columns {
        if let Some(total) = totals.remove(column.name.as_str()) {
            result.push(average(column.name.as_str(), total));
        }
    }

    let mut historical: Vec<(&str, (i64, i64))> = totals.into_iter().collect();
    historical.sort_by(|a, b| a.0.cmp(b.0));
    result.extend(historical.into_iter().map(|(name, total)| average(name, total)));

    result
}

fn member_productivity(
    input: MetricsInput<'_>,
    role_of: &dyn Fn(&Card) -> ColumnRole,
    history_by_card: &HashMap<Uuid, Vec<&CardHistory>>,
) -> Vec<MemberProductivity> {
    struct Tally {
        created: i64,
        completed: i64,
        in_progress: i64,
        completion_millis: i64,
        timed_completions: i64,
    }

    let mut tallies: HashMap<Uuid, Tally> = HashMap::new();

    for card in input.cards {
        let Some(assignee) = card.assignee_id else {
            continue;
        };
        let tally = tallies.entry(assignee).or_insert(Tally {
            created: 0,
            completed: 0,
            in_progress: 0,
            completion_millis: 0,
            timed_completions: 0,
        });

        tally.created += 1;
        match role_of(card) {
            ColumnRole::Done => {
                tally.completed += 1;
                if let Some(entries) = history_by_card.get(&card.id) {
                    if let (Some(first), Some(last)) = (entries.first(), entries.last()) {
                        tally.completion_millis += (last.moved_at - first.moved_at).num_milliseconds();
                        tally.timed_completions += 1;
                    }
                }
            }
            ColumnRole::InProgress => tally.in_progress += 1,
            ColumnRole::Backlog | ColumnRole::Custom => {}
        }
    }

    let mut members: Vec<MemberProductivity> = tallies
        .into_iter()
        .map(|(user_id, tally)| {
            let profile = input.users.iter().find(|u| u.id == user_id);
            MemberProductivity {
                user_id,
                name: profile.map(|u| u.name.clone()).unwrap_or_default(),
                email: profile.map(|u| u.email.clone()).unwrap_or_default(),
                cards_created: tally.created,
                cards_completed: tally.completed,
                cards_in_progress: tally.in_progress,
                average_time_to_complete: if tally.timed_completions == 0 {
                    0
                } else {
                    millis_to_hours(tally.completion_millis as f64 / tally.timed_completions as f64)
                },
            }
        })
        .collect();

    members.sort_by(|a, b| {
        b.cards_completed
            .cmp(&a.cards_completed)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    members
}

/// Loads a board's rows and computes its metrics against local time
///
/// All rows are read in one repeatable-read snapshot, so the result never
/// mixes states from before and after a concurrent move.
pub async fn compute_metrics(pool: &PgPool, board_id: Uuid) -> Result<MetricsSnapshot, KanbanError> {
    let mut tx = begin_snapshot(pool).await?;

    Board::find_by_id(&mut *tx, board_id)
        .await?
        .ok_or(KanbanError::NotFound("Board"))?;

    let columns = Column::list_by_board(&mut *tx, board_id).await?;
    let cards = Card::list_by_board(&mut *tx, board_id).await?;
    let history = CardHistory::list_for_board(&mut *tx, board_id).await?;

    let assignees: Vec<Uuid> = cards
        .iter()
        .filter_map(|c| c.assignee_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let users = User::find_summaries(&mut *tx, &assignees).await?;

    tx.commit().await?;

    debug!(
        board_id = %board_id,
        cards = cards.len(),
        history = history.len(),
        "Computing board metrics"
    );

    Ok(compute(
        MetricsInput {
            columns: &columns,
            cards: &cards,
            history: &history,
            users: &users,
        },
        Local::now(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    struct Fixture {
        todo: Column,
        doing: Column,
        done: Column,
        now: DateTime<Utc>,
    }

    fn column(name: &str, position: i32, role: ColumnRole) -> Column {
        Column {
            id: Uuid::new_v4(),
            board_id: Uuid::nil(),
            name: name.to_string(),
            position,
            color: None,
            role,
            created_at: Utc::now(),
        }
    }

    fn fixture() -> Fixture {
        Fixture {
            todo: column("To Do", 0, ColumnRole::Backlog),
            doing: column("In Progress", 1, ColumnRole::InProgress),
            done: column("Done", 2, ColumnRole::Done),
            now: Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap(),
        }
    }

    impl Fixture {
        fn columns(&self) -> Vec<Column> {
            vec![self.todo.clone(), self.doing.clone(), self.done.clone()]
        }

        fn card(&self, column: &Column, position: i32) -> Card {
            Card {
                id: Uuid::new_v4(),
                column_id: column.id,
                title: format!("card {}", position),
                description: None,
                priority: Default::default(),
                due_date: None,
                position,
                assignee_id: None,
                created_at: self.now,
                updated_at: self.now,
            }
        }
    }

    fn entry(card: &Card, from: &str, to: &str, moved_at: DateTime<Utc>) -> CardHistory {
        CardHistory {
            id: Uuid::new_v4(),
            card_id: card.id,
            from_column: from.to_string(),
            to_column: to.to_string(),
            moved_at,
        }
    }

    fn run(columns: &[Column], cards: &[Card], history: &[CardHistory], now: DateTime<Utc>) -> MetricsSnapshot {
        compute(
            MetricsInput {
                columns,
                cards,
                history,
                users: &[],
            },
            now,
        )
    }

    #[test]
    fn test_single_new_card_counts_per_column() {
        let f = fixture();
        let cards = vec![f.card(&f.todo, 0)];

        let snapshot = run(&f.columns(), &cards, &[], f.now);

        assert_eq!(snapshot.total_cards, 1);
        assert_eq!(
            snapshot.cards_by_column,
            vec![
                ColumnCount { name: "To Do".into(), count: 1 },
                ColumnCount { name: "In Progress".into(), count: 0 },
                ColumnCount { name: "Done".into(), count: 0 },
            ]
        );
        assert_eq!(snapshot.completed_count, 0);
    }

    #[test]
    fn test_done_cards_are_completed_and_never_overdue() {
        let f = fixture();
        let yesterday = f.now.date_naive() - Duration::days(1);

        let mut late = f.card(&f.doing, 0);
        late.due_date = Some(yesterday);
        let mut today = f.card(&f.todo, 0);
        today.due_date = Some(f.now.date_naive());

        let snapshot = run(&f.columns(), &[late.clone(), today.clone()], &[], f.now);
        assert_eq!(snapshot.overdue_count, 1);
        assert_eq!(snapshot.due_today_count, 1);
        assert_eq!(snapshot.completed_count, 0);

        late.column_id = f.done.id;
        today.column_id = f.done.id;
        let snapshot = run(&f.columns(), &[late, today], &[], f.now);
        assert_eq!(snapshot.overdue_count, 0);
        assert_eq!(snapshot.due_today_count, 0);
        assert_eq!(snapshot.completed_count, 2);
    }

    #[test]
    fn test_classification_follows_role_not_name() {
        let mut f = fixture();
        f.done.name = "Concluído".to_string();

        let card = f.card(&f.done, 0);
        let snapshot = run(&f.columns(), &[card], &[], f.now);
        assert_eq!(snapshot.completed_count, 1);
    }

    #[test]
    fn test_average_time_by_column() {
        let f = fixture();
        let card = f.card(&f.done, 0);
        let t0 = f.now - Duration::hours(10);
        let history = vec![
            entry(&card, "Backlog", "To Do", t0),
            entry(&card, "To Do", "In Progress", t0 + Duration::milliseconds(3_600_000)),
            entry(&card, "In Progress", "Done", t0 + Duration::milliseconds(3 * 3_600_000)),
        ];

        let snapshot = run(&f.columns(), &[card], &history, f.now);

        assert_eq!(
            snapshot.avg_time_by_column,
            vec![
                ColumnDuration { column: "To Do".into(), hours: 1 },
                ColumnDuration { column: "In Progress".into(), hours: 2 },
            ]
        );
    }

    #[test]
    fn test_average_time_ignores_history_order_and_rounds_half_up() {
        let f = fixture();
        let a = f.card(&f.done, 0);
        let b = f.card(&f.done, 1);
        let t0 = f.now - Duration::hours(20);

        // a: 1h in To Do, b: 2h in To Do -> 1.5h average rounds to 2
        let history = vec![
            entry(&b, "To Do", "Done", t0 + Duration::hours(2)),
            entry(&a, "To Do", "Done", t0 + Duration::hours(1)),
            entry(&a, "Backlog", "To Do", t0),
            entry(&b, "Backlog", "To Do", t0),
        ];

        let snapshot = run(&f.columns(), &[a, b], &history, f.now);
        assert_eq!(
            snapshot.avg_time_by_column,
            vec![ColumnDuration { column: "To Do".into(), hours: 2 }]
        );
    }

    #[test]
    fn test_historical_column_names_follow_board_columns() {
        let f = fixture();
        let card = f.card(&f.done, 0);
        let t0 = f.now - Duration::hours(30);
        let history = vec![
            entry(&card, "To Do", "Review", t0),
            entry(&card, "Review", "In Progress", t0 + Duration::hours(4)),
            entry(&card, "In Progress", "Archive", t0 + Duration::hours(5)),
            entry(&card, "Archive", "Done", t0 + Duration::hours(6)),
        ];

        let snapshot = run(&f.columns(), &[card], &history, f.now);
        let names: Vec<&str> = snapshot
            .avg_time_by_column
            .iter()
            .map(|d| d.column.as_str())
            .collect();
        assert_eq!(names, vec!["In Progress", "Archive", "Review"]);
    }

    #[test]
    fn test_completed_by_day_window() {
        let f = fixture();
        let mut cards = Vec::new();
        for (position, days_ago) in [0, 0, 2, 6, 7, 30].into_iter().enumerate() {
            let mut card = f.card(&f.done, position as i32);
            card.updated_at = f.now - Duration::days(days_ago);
            cards.push(card);
        }
        // Cards outside the done column never count.
        let mut open = f.card(&f.todo, 0);
        open.updated_at = f.now;
        cards.push(open);

        let snapshot = run(&f.columns(), &cards, &[], f.now);
        let today = f.now.date_naive();
        assert_eq!(
            snapshot.completed_by_day,
            vec![
                DayCount { date: today - Duration::days(6), count: 1 },
                DayCount { date: today - Duration::days(2), count: 1 },
                DayCount { date: today, count: 2 },
            ]
        );
    }

    #[test]
    fn test_local_day_boundaries_follow_time_zone() {
        let f = fixture();
        let mut card = f.card(&f.done, 0);
        // 23:30 UTC on May 9 is already May 10 at UTC+2.
        card.updated_at = Utc.with_ymd_and_hms(2024, 5, 9, 23, 30, 0).unwrap();
        let columns = f.columns();
        let cards = [card];
        let input = MetricsInput {
            columns: &columns,
            cards: &cards,
            history: &[],
            users: &[],
        };

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let snapshot = compute(input, f.now.with_timezone(&plus_two));
        assert_eq!(
            snapshot.completed_by_day,
            vec![DayCount { date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(), count: 1 }]
        );
    }

    #[test]
    fn test_member_productivity() {
        let f = fixture();
        let ana = UserSummary {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
        };
        let bruno = UserSummary {
            id: Uuid::new_v4(),
            name: "Bruno".into(),
            email: "bruno@example.com".into(),
        };
        let t0 = f.now - Duration::hours(48);

        let mut a1 = f.card(&f.done, 0);
        a1.assignee_id = Some(ana.id);
        let mut a2 = f.card(&f.done, 1);
        a2.assignee_id = Some(ana.id);
        let mut a3 = f.card(&f.doing, 0);
        a3.assignee_id = Some(ana.id);
        let mut b1 = f.card(&f.todo, 0);
        b1.assignee_id = Some(bruno.id);
        let unassigned = f.card(&f.todo, 1);

        let history = vec![
            entry(&a1, "To Do", "In Progress", t0),
            entry(&a1, "In Progress", "Done", t0 + Duration::hours(4)),
            // a2 has no history; it is completed but not timed.
            entry(&a3, "To Do", "In Progress", t0),
        ];

        let snapshot = compute(
            MetricsInput {
                columns: &f.columns(),
                cards: &[b1, a1, a2, a3, unassigned],
                history: &history,
                users: &[bruno.clone(), ana.clone()],
            },
            f.now,
        );

        assert_eq!(
            snapshot.member_productivity,
            vec![
                MemberProductivity {
                    user_id: ana.id,
                    name: "Ana".into(),
                    email: "ana@example.com".into(),
                    cards_created: 3,
                    cards_completed: 2,
                    cards_in_progress: 1,
                    average_time_to_complete: 4,
                },
                MemberProductivity {
                    user_id: bruno.id,
                    name: "Bruno".into(),
                    email: "bruno@example.com".into(),
                    cards_created: 1,
                    cards_completed: 0,
                    cards_in_progress: 0,
                    average_time_to_complete: 0,
                },
            ]
        );
    }

    #[test]
    fn test_compute_is_idempotent() {
        let f = fixture();
        let mut card = f.card(&f.doing, 0);
        card.due_date = Some(f.now.date_naive());
        let history = vec![
            entry(&card, "To Do", "In Progress", f.now - Duration::hours(3)),
        ];
        let columns = f.columns();
        let cards = [card];

        let first = run(&columns, &cards, &history, f.now);
        let second = run(&columns, &cards, &history, f.now);
        assert_eq!(first, second);
    }

    #[test]
    fn test_millis_to_hours_rounds_half_up() {
        assert_eq!(millis_to_hours(0.0), 0);
        assert_eq!(millis_to_hours(1_799_999.0), 0);
        assert_eq!(millis_to_hours(1_800_000.0), 1);
        assert_eq!(millis_to_hours(5_400_000.0), 2);
    }
}
