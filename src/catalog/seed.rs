// Static seed catalog used when the odds feed is unavailable.
//
// Event times are offsets from `now` so the seed always has open markets;
// each closes an hour before its scheduled start.

use super::{Market, Selection};
use chrono::{DateTime, Duration, Utc};

fn seed_market(
    id: &str,
    sport: &str,
    away: &str,
    home: &str,
    starts_in_hours: i64,
    now: DateTime<Utc>,
    selections: Vec<(&str, &str, i32)>,
) -> Market {
    Market {
        id: id.to_string(),
        sport: sport.to_string(),
        event: format!("{} vs {}", away, home),
        home_team: home.to_string(),
        away_team: away.to_string(),
        start_time: now + Duration::hours(starts_in_hours),
        close_time: now + Duration::hours(starts_in_hours - 1),
        selections: selections
            .into_iter()
            .map(|(sel_id, name, odds)| Selection {
                id: sel_id.to_string(),
                name: name.to_string(),
                odds,
            })
            .collect(),
    }
}

pub fn seed_markets(now: DateTime<Utc>) -> Vec<Market> {
    vec![
        seed_market(
            "nfl-1",
            "nfl",
            "Kansas City Chiefs",
            "Buffalo Bills",
            24,
            now,
            vec![
                ("nfl-1-1", "Kansas City Chiefs -3.5", -110),
                ("nfl-1-2", "Buffalo Bills +3.5", -110),
                ("nfl-1-3", "Over 48.5", -105),
                ("nfl-1-4", "Under 48.5", -115),
            ],
        ),
        seed_market(
            "nfl-2",
            "nfl",
            "Dallas Cowboys",
            "Philadelphia Eagles",
            48,
            now,
            vec![
                ("nfl-2-1", "Dallas Cowboys +2.5", -105),
                ("nfl-2-2", "Philadelphia Eagles -2.5", -115),
                ("nfl-2-3", "Over 45.5", -110),
                ("nfl-2-4", "Under 45.5", -110),
            ],
        ),
        seed_market(
            "nba-1",
            "nba",
            "Los Angeles Lakers",
            "Golden State Warriors",
            6,
            now,
            vec![
                ("nba-1-1", "Los Angeles Lakers +4.5", -110),
                ("nba-1-2", "Golden State Warriors -4.5", -110),
                ("nba-1-3", "Over 228.5", -108),
                ("nba-1-4", "Under 228.5", -112),
            ],
        ),
        seed_market(
            "nba-2",
            "nba",
            "Boston Celtics",
            "Miami Heat",
            30,
            now,
            vec![
                ("nba-2-1", "Boston Celtics -7.5", -105),
                ("nba-2-2", "Miami Heat +7.5", -115),
                ("nba-2-3", "Over 215.5", -110),
                ("nba-2-4", "Under 215.5", -110),
            ],
        ),
        seed_market(
            "mlb-1",
            "mlb",
            "New York Yankees",
            "Boston Red Sox",
            12,
            now,
            vec![
                ("mlb-1-1", "New York Yankees ML", -145),
                ("mlb-1-2", "Boston Red Sox ML", 125),
                ("mlb-1-3", "Over 8.5 Runs", -115),
                ("mlb-1-4", "Under 8.5 Runs", -105),
            ],
        ),
        seed_market(
            "nhl-1",
            "nhl",
            "Toronto Maple Leafs",
            "Montreal Canadiens",
            18,
            now,
            vec![
                ("nhl-1-1", "Toronto Maple Leafs ML", -135),
                ("nhl-1-2", "Montreal Canadiens ML", 115),
                ("nhl-1-3", "Over 6.5 Goals", 100),
                ("nhl-1-4", "Under 6.5 Goals", -120),
            ],
        ),
        seed_market(
            "soccer-1",
            "soccer",
            "Manchester United",
            "Liverpool",
            36,
            now,
            vec![
                ("soccer-1-1", "Manchester United", 210),
                ("soccer-1-2", "Draw", 240),
                ("soccer-1-3", "Liverpool", 120),
                ("soccer-1-4", "Over 2.5 Goals", -125),
                ("soccer-1-5", "Under 2.5 Goals", 105),
            ],
        ),
    ]
}
