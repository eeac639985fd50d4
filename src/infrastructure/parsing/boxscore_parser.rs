//! Boxscore page extraction: one typed row per player.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::error::{ParseError, ParseResult};
use super::selectors::BoxscoreSelectors;
use crate::domain::boxscore::{BoxscoreRow, ShotLine, TeamSide};

/// Shot cells come as `"made/attempted"`.
static FRACTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*/\s*(\d+)").expect("fraction regex"));

/// Parser for the boxscore tab of a game page.
pub struct BoxscoreParser {
    config: BoxscoreSelectors,
    home_team: Selector,
    away_team: Selector,
    table: Selector,
    team_body: Selector,
    player_row: Selector,
    starter: Selector,
    jersey: Selector,
    name: Selector,
    position: Selector,
    minutes: Selector,
    points: Selector,
    two_points: Selector,
    three_points: Selector,
    free_throws: Selector,
    offensive_rebounds: Selector,
    defensive_rebounds: Selector,
    assists: Selector,
    steals: Selector,
    blocks: Selector,
    turnovers: Selector,
    personal_fouls: Selector,
    technical_fouls: Selector,
}

impl BoxscoreParser {
    pub fn new(config: &BoxscoreSelectors) -> ParseResult<Self> {
        Ok(Self {
            home_team: super::compile(&config.home_team)?,
            away_team: super::compile(&config.away_team)?,
            table: super::compile(&config.table)?,
            team_body: super::compile(&config.team_body)?,
            player_row: super::compile(&config.player_row)?,
            starter: super::compile(&config.starter)?,
            jersey: super::compile(&config.jersey)?,
            name: super::compile(&config.name)?,
            position: super::compile(&config.position)?,
            minutes: super::compile(&config.minutes)?,
            points: super::compile(&config.points)?,
            two_points: super::compile(&config.two_points)?,
            three_points: super::compile(&config.three_points)?,
            free_throws: super::compile(&config.free_throws)?,
            offensive_rebounds: super::compile(&config.offensive_rebounds)?,
            defensive_rebounds: super::compile(&config.defensive_rebounds)?,
            assists: super::compile(&config.assists)?,
            steals: super::compile(&config.steals)?,
            blocks: super::compile(&config.blocks)?,
            turnovers: super::compile(&config.turnovers)?,
            personal_fouls: super::compile(&config.personal_fouls)?,
            technical_fouls: super::compile(&config.technical_fouls)?,
            config: config.clone(),
        })
    }

    /// Extract every player row from a settled boxscore page.
    pub fn parse(&self, html: &str) -> ParseResult<Vec<BoxscoreRow>> {
        let doc = Html::parse_document(html);

        let home = element_text(&doc, &self.home_team).ok_or(ParseError::ScoreboardMissing)?;
        let away = element_text(&doc, &self.away_team).ok_or(ParseError::ScoreboardMissing)?;

        let table = doc
            .select(&self.table)
            .next()
            .ok_or_else(|| ParseError::TableMissing {
                selector: self.config.table.clone(),
            })?;

        let bodies: Vec<ElementRef> = table.select(&self.team_body).collect();
        let skip = self.config.team_body_skip;
        if bodies.len() < skip + 2 {
            return Err(ParseError::TeamSectionsMissing {
                found: bodies.len(),
            });
        }

        let mut rows = Vec::new();
        for (section, body) in bodies[skip..skip + 2].iter().enumerate() {
            let (side, team) = if section == 0 {
                (TeamSide::Home, home.as_str())
            } else {
                (TeamSide::Away, away.as_str())
            };
            let before = rows.len();
            for tr in body.select(&self.player_row) {
                if has_class(tr, &self.config.total_row_class) {
                    continue;
                }
                // Non-player rows have no starter cell at all.
                let Some(starter_text) = cell_text(tr, &self.starter) else {
                    continue;
                };
                let index = rows.len();
                rows.push(self.parse_row(tr, side, team, starter_text == "*", index)?);
            }
            if rows.len() == before {
                return Err(ParseError::NoPlayerRows {
                    team: team.to_string(),
                });
            }
        }
        Ok(rows)
    }

    fn parse_row(
        &self,
        tr: ElementRef,
        side: TeamSide,
        team: &str,
        starter: bool,
        index: usize,
    ) -> ParseResult<BoxscoreRow> {
        let jersey = cell_text(tr, &self.jersey).ok_or_else(|| ParseError::CellMissing {
            field: "jersey".into(),
            index,
        })?;
        let name = cell_text(tr, &self.name).ok_or_else(|| ParseError::CellMissing {
            field: "name".into(),
            index,
        })?;

        Ok(BoxscoreRow {
            team: team.to_string(),
            side,
            name,
            jersey,
            position: cell_text(tr, &self.position).filter(|p| !p.is_empty()),
            starter,
            minutes: parse_minutes(&cell_text(tr, &self.minutes).unwrap_or_default()),
            two_points: parse_fraction(&cell_text(tr, &self.two_points).unwrap_or_default()),
            three_points: parse_fraction(&cell_text(tr, &self.three_points).unwrap_or_default()),
            free_throws: parse_fraction(&cell_text(tr, &self.free_throws).unwrap_or_default()),
            offensive_rebounds: parse_count(cell_text(tr, &self.offensive_rebounds)),
            defensive_rebounds: parse_count(cell_text(tr, &self.defensive_rebounds)),
            assists: parse_count(cell_text(tr, &self.assists)),
            steals: parse_count(cell_text(tr, &self.steals)),
            blocks: parse_count(cell_text(tr, &self.blocks)),
            turnovers: parse_count(cell_text(tr, &self.turnovers)),
            personal_fouls: parse_count(cell_text(tr, &self.personal_fouls)),
            technical_fouls: parse_count(cell_text(tr, &self.technical_fouls)),
            points: parse_count(cell_text(tr, &self.points)),
        })
    }
}

fn element_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn cell_text(tr: ElementRef, selector: &Selector) -> Option<String> {
    tr.select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

fn has_class(el: ElementRef, class: &str) -> bool {
    el.value()
        .attr("class")
        .is_some_and(|c| c.split_whitespace().any(|x| x == class))
}

/// `"made/attempted"` cell into a [`ShotLine`]; anything malformed becomes
/// 0/0 and is left for the validator to flag.
pub(crate) fn parse_fraction(text: &str) -> ShotLine {
    match FRACTION_RE.captures(text) {
        Some(caps) => ShotLine::new(
            caps[1].parse().unwrap_or(0),
            caps[2].parse().unwrap_or(0),
        ),
        None => ShotLine::default(),
    }
}

/// Minutes come as `"MM:SS"`, occasionally as a bare minute count.
pub(crate) fn parse_minutes(text: &str) -> Duration {
    let text = text.trim();
    if let Some((m, s)) = text.split_once(':') {
        let minutes: u64 = m.trim().parse().unwrap_or(0);
        let seconds: u64 = s.trim().parse().unwrap_or(0);
        Duration::from_secs(minutes * 60 + seconds)
    } else {
        Duration::from_secs(text.parse::<u64>().unwrap_or(0) * 60)
    }
}

fn parse_count(text: Option<String>) -> u32 {
    text.and_then(|t| t.trim().parse().ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_tr(jersey: &str, name: &str, minutes: &str, pts: u32, starter: bool) -> String {
        format!(
            r#"<tr>
                <td class="inicial">{star}</td>
                <td class="dorsal">{jersey}</td>
                <td class="nombre"><a href="jugador.aspx?c=101">{name}</a></td>
                <td class="posicion">Base</td>
                <td class="minutos">{minutes}</td>
                <td class="puntos">{pts}</td>
                <td class="tiros dos">4/9</td>
                <td class="tiros tres">2/5</td>
                <td class="tiros libres">3/4</td>
                <td class="rebotes ofensivos">1</td>
                <td class="rebotes defensivos">4</td>
                <td class="asistencias">6</td>
                <td class="recuperaciones">2</td>
                <td class="tapones">1</td>
                <td class="perdidas">3</td>
                <td class="faltas cometidas">2</td>
                <td class="faltas tecnicas">0</td>
            </tr>"#,
            star = if starter { "*" } else { "" },
        )
    }

    fn fixture(home_rows: &[String], away_rows: &[String]) -> String {
        format!(
            r#"<html><body>
            <div class="box-marcador">
                <div class="columna equipo local">
                    <div class="nombre"><a>CB EGIDO</a></div>
                    <div class="resultado">80</div>
                </div>
                <div class="columna equipo visitante">
                    <div class="nombre"><a>CB ARIDANE</a></div>
                    <div class="resultado">75</div>
                </div>
            </div>
            <h1 class="titulo-modulo">Ficha</h1>
            <div class="responsive-scroll"><table>
                <tbody><tr><td>20</td><td>18</td></tr></tbody>
                <tbody><tr><td>22</td><td>15</td></tr></tbody>
                <tbody>
                    {home}
                    <tr class="row-total"><td class="inicial"></td><td>Totales</td></tr>
                </tbody>
                <tbody>
                    {away}
                </tbody>
            </table></div>
            </body></html>"#,
            home = home_rows.join("\n"),
            away = away_rows.join("\n"),
        )
    }

    fn default_parser() -> BoxscoreParser {
        BoxscoreParser::new(&BoxscoreSelectors::default()).unwrap()
    }

    #[test]
    fn produces_one_row_per_player() {
        let home: Vec<String> = (0..5)
            .map(|i| player_tr(&i.to_string(), &format!("LOCAL {i}"), "28:30", 17, i < 5))
            .collect();
        let away: Vec<String> = (0..4)
            .map(|i| player_tr(&i.to_string(), &format!("VISIT {i}"), "35:00", 17, false))
            .collect();
        let rows = default_parser().parse(&fixture(&home, &away)).unwrap();
        assert_eq!(rows.len(), 9);
        assert_eq!(rows.iter().filter(|r| r.side == TeamSide::Home).count(), 5);
        assert_eq!(rows.iter().filter(|r| r.side == TeamSide::Away).count(), 4);
        // No duplicates: names are unique in the fixture.
        let mut names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 9);
    }

    #[test]
    fn extracts_typed_fields() {
        let home = vec![player_tr("7", "A. PEREZ", "28:30", 17, true)];
        let away = vec![player_tr("11", "B. RUIZ", "40", 17, false)];
        let rows = default_parser().parse(&fixture(&home, &away)).unwrap();

        let perez = &rows[0];
        assert_eq!(perez.team, "CB EGIDO");
        assert_eq!(perez.jersey, "7");
        assert!(perez.starter);
        assert_eq!(perez.position.as_deref(), Some("Base"));
        assert_eq!(perez.minutes, Duration::from_secs(28 * 60 + 30));
        assert_eq!(perez.two_points, ShotLine::new(4, 9));
        assert_eq!(perez.three_points, ShotLine::new(2, 5));
        assert_eq!(perez.free_throws, ShotLine::new(3, 4));
        assert_eq!(perez.blocks, 1);
        assert_eq!(perez.points, 17);
        assert!(perez.is_internally_consistent());

        // Bare minute count coerces too.
        assert_eq!(rows[1].minutes, Duration::from_secs(40 * 60));
        assert!(!rows[1].starter);
    }

    #[test]
    fn total_rows_are_skipped() {
        let home = vec![player_tr("7", "A. PEREZ", "20:00", 17, true)];
        let away = vec![player_tr("11", "B. RUIZ", "20:00", 17, false)];
        let rows = default_parser().parse(&fixture(&home, &away)).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.name != "Totales"));
    }

    #[test]
    fn missing_table_is_a_parse_error() {
        let err = default_parser()
            .parse("<html><body><p>cargando...</p></body></html>")
            .unwrap_err();
        assert!(matches!(err, ParseError::ScoreboardMissing));
    }

    #[test]
    fn empty_team_section_is_a_parse_error() {
        let home = vec![player_tr("7", "A. PEREZ", "20:00", 17, true)];
        let err = default_parser().parse(&fixture(&home, &[])).unwrap_err();
        assert!(matches!(err, ParseError::NoPlayerRows { team } if team == "CB ARIDANE"));
    }

    #[test]
    fn fraction_coercion() {
        assert_eq!(parse_fraction("4/9"), ShotLine::new(4, 9));
        assert_eq!(parse_fraction(" 10 / 12 "), ShotLine::new(10, 12));
        assert_eq!(parse_fraction(""), ShotLine::default());
        assert_eq!(parse_fraction("-"), ShotLine::default());
    }

    #[test]
    fn minutes_coercion() {
        assert_eq!(parse_minutes("28:30"), Duration::from_secs(28 * 60 + 30));
        assert_eq!(parse_minutes("40"), Duration::from_secs(40 * 60));
        assert_eq!(parse_minutes(""), Duration::ZERO);
        assert_eq!(parse_minutes("0:00"), Duration::ZERO);
    }
}
