//! Shared stubs for engine-level tests: a scriptable site, page clients
//! that never touch the network, and fixture pages that exercise the real
//! parser and validator.
//!
//! Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use feb_boxscores::application::AppConfig;
use feb_boxscores::domain::{Game, GameKey, Phase};
use feb_boxscores::infrastructure::page_client::{
    FetchError, PageClient, PageClientFactory, RawPage, ReadinessProbe,
};

/// What a stub fetch does for a URL.
#[derive(Debug, Clone)]
pub enum Response {
    Page(String),
    Transient,
    Fatal,
    /// Sleep, then serve the page.
    Slow(Duration, String),
}

/// Scriptable fake site shared by all stub sessions. Responses per URL are
/// consumed FIFO; the last one repeats forever. Unscripted URLs fail
/// transiently.
#[derive(Default)]
pub struct StubSite {
    responses: Mutex<HashMap<String, Vec<Response>>>,
    pub fetch_count: AtomicUsize,
    pub sessions_created: AtomicUsize,
}

impl StubSite {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, url: &str, responses: Vec<Response>) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), responses);
    }

    fn next_response(&self, url: &str) -> Response {
        let mut map = self.responses.lock().unwrap();
        match map.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.remove(0),
            Some(queue) => queue.first().cloned().unwrap_or(Response::Transient),
            None => Response::Transient,
        }
    }
}

pub struct StubClient {
    site: Arc<StubSite>,
}

#[async_trait]
impl PageClient for StubClient {
    async fn fetch(&mut self, url: &str, _probe: &ReadinessProbe) -> Result<RawPage, FetchError> {
        self.site.fetch_count.fetch_add(1, Ordering::SeqCst);
        match self.site.next_response(url) {
            Response::Page(html) => Ok(RawPage {
                url: url.to_string(),
                html,
            }),
            Response::Transient => Err(FetchError::Navigation {
                url: url.to_string(),
                message: "stub timeout".to_string(),
            }),
            Response::Fatal => Err(FetchError::SessionLost("stub session lost".to_string())),
            Response::Slow(delay, html) => {
                tokio::time::sleep(delay).await;
                Ok(RawPage {
                    url: url.to_string(),
                    html,
                })
            }
        }
    }

    async fn close(self: Box<Self>) {}
}

pub struct StubFactory {
    site: Arc<StubSite>,
}

impl StubFactory {
    pub fn new(site: Arc<StubSite>) -> Arc<Self> {
        Arc::new(Self { site })
    }
}

#[async_trait]
impl PageClientFactory for StubFactory {
    async fn create(&self) -> Result<Box<dyn PageClient>, FetchError> {
        self.site.sessions_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubClient {
            site: Arc::clone(&self.site),
        }))
    }
}

fn player_tr(jersey: u32, name: &str) -> String {
    format!(
        r#"<tr>
            <td class="inicial">*</td>
            <td class="dorsal">{jersey}</td>
            <td class="nombre"><a href="jugador.aspx?c={jersey}">{name}</a></td>
            <td class="minutos">40:00</td>
            <td class="puntos">8</td>
            <td class="tiros dos">2/4</td>
            <td class="tiros tres">1/3</td>
            <td class="tiros libres">1/2</td>
            <td class="rebotes ofensivos">1</td>
            <td class="rebotes defensivos">3</td>
            <td class="asistencias">2</td>
            <td class="recuperaciones">1</td>
            <td class="perdidas">1</td>
            <td class="faltas cometidas">2</td>
        </tr>"#
    )
}

/// A structurally complete, statistically balanced boxscore page: five
/// players a side at 40:00 each, shot lines adding up to the points.
pub fn boxscore_page(home: &str, away: &str) -> String {
    let home_rows: String = (1..=5).map(|i| player_tr(i, &format!("{home} P{i}"))).collect();
    let away_rows: String = (1..=5).map(|i| player_tr(i, &format!("{away} P{i}"))).collect();
    format!(
        r#"<html><body>
        <div class="box-marcador">
            <div class="columna equipo local">
                <div class="nombre"><a>{home}</a></div>
                <div class="resultado">40</div>
            </div>
            <div class="columna equipo visitante">
                <div class="nombre"><a>{away}</a></div>
                <div class="resultado">40</div>
            </div>
        </div>
        <h1 class="titulo-modulo">Ficha</h1>
        <div class="responsive-scroll"><table>
            <tbody><tr><td>10</td></tr></tbody>
            <tbody><tr><td>10</td></tr></tbody>
            <tbody>{home_rows}</tbody>
            <tbody>{away_rows}</tbody>
        </table></div>
        </body></html>"#
    )
}

/// A settled page whose boxscore structure is missing: parseable never.
pub fn broken_page() -> String {
    "<html><body><p>sin datos</p></body></html>".to_string()
}

/// A schedule page: matchday dropdown plus the results grid.
pub fn schedule_page(matchdays: u32, games: &[(&str, &str, &str)]) -> String {
    let options: String = (1..=matchdays)
        .map(|i| format!("<option value=\"{i}\">Jornada {i}</option>"))
        .collect();
    let rows: String = games
        .iter()
        .map(|(home, away, id)| {
            format!(
                r#"<tr>
                    <td><a>{home}</a> - <a>{away}</a></td>
                    <td><a href="/partido.aspx?p={id}&med=0">70-65</a></td>
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

pub fn game_url(game_id: &str) -> String {
    format!("https://stub.invalid/partido/{game_id}")
}

/// A phase with one game per matchday, URLs pointing at the stub site.
pub fn make_phase(code: &str, game_ids: &[&str]) -> Phase {
    let games = game_ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let key = GameKey {
                season: "2024/2025".to_string(),
                phase: code.to_string(),
                matchday: i as u32 + 1,
                home: format!("HOME {id}"),
                away: format!("AWAY {id}"),
            };
            Game::new(key, *id, game_url(id))
        })
        .collect();
    Phase::new(format!("Liga Regular \"{code}\""), code, games)
}

/// Script a successful page for every game of the given phases.
pub fn serve_all(site: &StubSite, phases: &[Phase]) {
    for phase in phases {
        for game in &phase.games {
            site.script(
                &game.url,
                vec![Response::Page(boxscore_page(&game.key.home, &game.key.away))],
            );
        }
    }
}

/// Config tuned for tests: tiny backoff, no jitter.
pub fn test_config(workers: usize) -> AppConfig {
    let mut config = AppConfig::default();
    config.engine.workers = workers;
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 5;
    config.retry.jitter_ms = 0;
    config
}
