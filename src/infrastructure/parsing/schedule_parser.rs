//! Schedule page extraction: matchday count and per-matchday game ids.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use super::error::{ParseError, ParseResult};
use super::selectors::ScheduleSelectors;

/// Game ids travel in the result link's href as `p=<id>`.
static GAME_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[?&]p=(\d+)").expect("game id regex"));

/// One game as listed on a schedule grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledGame {
    pub matchday: u32,
    pub game_id: String,
    pub home: String,
    pub away: String,
}

/// Parser for the per-phase results/schedule page.
pub struct ScheduleParser {
    config: ScheduleSelectors,
    matchday_select: Selector,
    matchday_option: Selector,
    grid: Selector,
    row: Selector,
    teams_cell: Selector,
    result_link: Selector,
}

impl ScheduleParser {
    pub fn new(config: &ScheduleSelectors) -> ParseResult<Self> {
        Ok(Self {
            matchday_select: super::compile(&config.matchday_select)?,
            matchday_option: super::compile(&config.matchday_option)?,
            grid: super::compile(&config.grid)?,
            row: super::compile(&config.row)?,
            teams_cell: super::compile(&config.teams_cell)?,
            result_link: super::compile(&config.result_link)?,
            config: config.clone(),
        })
    }

    /// How many matchdays the phase has, read off the matchday dropdown.
    pub fn matchday_count(&self, html: &str) -> ParseResult<u32> {
        let doc = Html::parse_document(html);
        let select = doc.select(&self.matchday_select).next().ok_or_else(|| {
            ParseError::MatchdaySelectMissing {
                selector: self.config.matchday_select.clone(),
            }
        })?;
        let count = select.select(&self.matchday_option).count();
        if count == 0 {
            return Err(ParseError::MatchdaySelectMissing {
                selector: self.config.matchday_select.clone(),
            });
        }
        Ok(count as u32)
    }

    /// Games of one matchday, in grid order. Rows without a result link
    /// (headers, separators) are skipped; rows with a link but without two
    /// team anchors are malformed and skipped as well.
    pub fn parse_matchday(&self, html: &str, matchday: u32) -> ParseResult<Vec<ScheduledGame>> {
        let doc = Html::parse_document(html);
        let grid = doc
            .select(&self.grid)
            .next()
            .ok_or_else(|| ParseError::ScheduleMissing {
                selector: self.config.grid.clone(),
            })?;

        let mut games = Vec::new();
        for tr in grid.select(&self.row) {
            let Some(link) = tr.select(&self.result_link).next() else {
                continue;
            };
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let Some(caps) = GAME_ID_RE.captures(href) else {
                continue;
            };
            let teams: Vec<String> = tr
                .select(&self.teams_cell)
                .map(|a| a.text().collect::<String>().trim().to_string())
                .collect();
            if teams.len() < 2 {
                continue;
            }
            games.push(ScheduledGame {
                matchday,
                game_id: caps[1].to_string(),
                home: teams[0].clone(),
                away: teams[1].clone(),
            });
        }
        Ok(games)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule_fixture(matchdays: usize, games: &[(&str, &str, &str)]) -> String {
        let options: String = (1..=matchdays)
            .map(|i| format!("<option value=\"{i}\">Jornada {i}</option>"))
            .collect();
        let rows: String = games
            .iter()
            .map(|(home, away, id)| {
                format!(
                    r#"<tr>
                        <td><a>{home}</a> - <a>{away}</a></td>
                        <td><a href="/partido.aspx?p={id}&med=0">78-71</a></td>
                    </tr>"#
                )
            })
            .collect();
        format!(
            r#"<html><body>
            <select id="_ctl0_MainContentPlaceHolderMaster_jornadasDropDownList">{options}</select>
            <table id="_ctl0_MainContentPlaceHolderMaster_jornadaDataGrid">
                <tr><th>Equipos</th><th>Resultado</th></tr>
                {rows}
            </table>
            </body></html>"#
        )
    }

    fn default_parser() -> ScheduleParser {
        ScheduleParser::new(&ScheduleSelectors::default()).unwrap()
    }

    #[test]
    fn counts_matchdays_from_dropdown() {
        let html = schedule_fixture(26, &[]);
        assert_eq!(default_parser().matchday_count(&html).unwrap(), 26);
    }

    #[test]
    fn missing_dropdown_is_a_parse_error() {
        let err = default_parser()
            .matchday_count("<html><body></body></html>")
            .unwrap_err();
        assert!(matches!(err, ParseError::MatchdaySelectMissing { .. }));
    }

    #[test]
    fn extracts_games_in_grid_order() {
        let html = schedule_fixture(
            3,
            &[
                ("CB EGIDO", "CB ARIDANE", "2413725"),
                ("UB LA PALMA", "SANTA CRUZ", "2413726"),
            ],
        );
        let games = default_parser().parse_matchday(&html, 4).unwrap();
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].game_id, "2413725");
        assert_eq!(games[0].home, "CB EGIDO");
        assert_eq!(games[0].away, "CB ARIDANE");
        assert_eq!(games[0].matchday, 4);
        assert_eq!(games[1].game_id, "2413726");
    }

    #[test]
    fn header_rows_are_skipped() {
        let html = schedule_fixture(3, &[("A", "B", "1")]);
        let games = default_parser().parse_matchday(&html, 1).unwrap();
        assert_eq!(games.len(), 1);
    }

    #[test]
    fn missing_grid_is_a_parse_error() {
        let err = default_parser()
            .parse_matchday("<html><body></body></html>", 1)
            .unwrap_err();
        assert!(matches!(err, ParseError::ScheduleMissing { .. }));
    }
}
