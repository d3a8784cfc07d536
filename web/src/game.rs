use std::rc::Rc;

use clap::Args;
use gloo::timers::callback::Timeout;
use grid_waldo_core as game;
use web_sys::HtmlInputElement;
use yew::{html::Scope, prelude::*};

use crate::services::{Services, placeholder_images};
use crate::settings::ServiceSettings;
use crate::utils::*;

const INTRO_STEPS: [(&str, &str); 3] = [
    (
        "Welcome to Grid Waldo!",
        "A game of attention and memory with quick-reflex mechanics.",
    ),
    (
        "How to Play",
        "Watch carefully! One image will briefly flash. Your task is to describe which image was highlighted.",
    ),
    (
        "Ready?",
        "You'll have limited chances to guess correctly. Good luck!",
    ),
];

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Msg {
    IntroStep(usize),
    Start,
    Restart,
    Tick(game::TimerTicket),
    Input(String),
    Submit,
    AttemptResolved(game::PendingAttempt, game::MatchOutcome),
    ImagesLoaded(Result<Vec<game::ImageRecord>, game::ServiceError>),
    DismissNotice,
}

#[derive(Args, Properties, Debug, Clone, PartialEq)]
pub(crate) struct GameProps {
    /// Force a seed instead of random
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Minimum similarity for an image to count as matched
    #[arg(short, long)]
    pub threshold: Option<f32>,
}

/// One browser timeout per engine timer; dropping a `Timeout` cancels it.
#[derive(Debug, Default)]
struct TimerSlots {
    countdown: Option<Timeout>,
    highlight: Option<Timeout>,
    clock: Option<Timeout>,
    cooldown: Option<Timeout>,
}

impl TimerSlots {
    fn slot(&mut self, timer: game::Timer) -> &mut Option<Timeout> {
        use game::Timer::*;
        match timer {
            Countdown => &mut self.countdown,
            Highlight => &mut self.highlight,
            Clock => &mut self.clock,
            Cooldown => &mut self.cooldown,
        }
    }

    fn schedule(&mut self, link: &Scope<GameView>, ticket: game::TimerTicket, delay_ms: u32) {
        let link = link.clone();
        let timeout = Timeout::new(delay_ms, move || link.send_message(Msg::Tick(ticket)));
        *self.slot(ticket.timer) = Some(timeout);
    }

    fn cancel(&mut self, timer: game::Timer) {
        self.slot(timer).take();
    }

    fn cancel_all(&mut self) {
        *self = Self::default();
    }
}

fn input_open(engine: &game::GameEngine, in_flight: bool) -> bool {
    engine.accepts_attempts() && !in_flight
}

#[derive(Debug)]
pub(crate) struct GameView {
    engine: game::GameEngine,
    services: Rc<Services>,
    text: String,
    intro_step: usize,
    notice: Option<game::Notice>,
    notice_timeout: Option<Timeout>,
    timers: TimerSlots,
    in_flight: bool,
}

impl GameView {
    fn apply_effects(&mut self, ctx: &Context<Self>) {
        use game::Effect::*;

        let effects: Vec<_> = self.engine.drain_effects().collect();
        for effect in effects {
            match effect {
                Schedule { ticket, delay_ms } => self.timers.schedule(ctx.link(), ticket, delay_ms),
                Cancel(timer) => self.timers.cancel(timer),
                CancelAll => self.timers.cancel_all(),
                Notify(notice) => self.show_notice(ctx, notice),
                ClearInput => self.text.clear(),
            }
        }
    }

    fn show_notice(&mut self, ctx: &Context<Self>, notice: game::Notice) {
        log::info!("{}", notice.title);
        let link = ctx.link().clone();
        self.notice_timeout = Some(Timeout::new(notice.duration_ms, move || {
            link.send_message(Msg::DismissNotice)
        }));
        self.notice = Some(notice);
    }

    fn submit(&mut self, ctx: &Context<Self>) {
        let pending = match self.engine.begin_attempt(&self.text) {
            Ok(pending) => pending,
            Err(err) => {
                log::debug!("attempt refused: {err}");
                return;
            }
        };

        self.in_flight = true;
        let services = Rc::clone(&self.services);
        ctx.link().send_future(async move {
            let outcome = pending
                .evaluate(&services.embedder, &services.database)
                .await;
            Msg::AttemptResolved(pending, outcome)
        });
    }

    fn status_view(&self) -> Html {
        let round = self.engine.round();
        html! {
            <nav class="status">
                <aside>{format!("Time: {}s", round.remaining_secs())}</aside>
                <span>{format!("Score: {}", round.score())}</span>
                <aside>{format!("Chances: {}", round.chances())}</aside>
            </nav>
        }
    }

    fn grid_view(&self) -> Html {
        let cells = self.engine.grid().cells();
        html! {
            <table class="grid">
                {
                    for cells.chunks(usize::from(game::GRID_SIDE)).map(|row| html! {
                        <tr>
                            {
                                for row.iter().map(|cell| html! {
                                    <td class={classes!("cell", cell.visual().class_name())}>
                                        <img src={cell.image_url().to_string()} alt={format!("cell {}", cell.index().get())}/>
                                    </td>
                                })
                            }
                        </tr>
                    })
                }
            </table>
        }
    }

    fn answer_view(&self, ctx: &Context<Self>) -> Html {
        if !input_open(&self.engine, self.in_flight) {
            let hint = match self.engine.phase() {
                game::Phase::Countdown { .. } | game::Phase::Highlighting { .. } => {
                    "Wait for the timer to stop!"
                }
                _ => "",
            };
            return html! {
                <div class="answer locked">
                    <span>{if self.in_flight { self.text.as_str() } else { hint }}</span>
                    <div class="spinner"/>
                </div>
            };
        }

        let oninput = ctx.link().callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            Msg::Input(input.value())
        });
        let onsubmit = ctx.link().callback(|e: SubmitEvent| {
            e.prevent_default();
            Msg::Submit
        });

        html! {
            <form class="answer" {onsubmit}>
                <input type="text" placeholder="Type here..." value={self.text.clone()} {oninput}/>
            </form>
        }
    }

    fn history_view(&self) -> Html {
        let history = self.engine.round().history();
        html! {
            <aside class="history">
                <h3>{"History"}</h3>
                if history.is_empty() {
                    <p>{"No attempts yet"}</p>
                } else {
                    <ul>
                        {
                            for history.iter().rev().map(|record| {
                                let result = match record.result {
                                    game::AttemptResult::Correct => "correct",
                                    game::AttemptResult::Incorrect => "incorrect",
                                    game::AttemptResult::Partial => "partial",
                                };
                                html! {
                                    <li class={result}>
                                        <span>{record.text.clone()}</span>
                                        <small>{record.timestamp.format("%H:%M:%S").to_string()}</small>
                                    </li>
                                }
                            })
                        }
                    </ul>
                }
            </aside>
        }
    }

    fn notice_view(&self) -> Html {
        let Some(notice) = &self.notice else {
            return html! {};
        };
        let level = match notice.level {
            game::NoticeLevel::Info => "info",
            game::NoticeLevel::Success => "success",
            game::NoticeLevel::Warning => "warning",
            game::NoticeLevel::Error => "error",
        };
        html! {
            <div class={classes!("notice", level)}>
                <strong>{notice.title.as_ref()}</strong>
                if let Some(description) = &notice.description {
                    <p>{description.as_ref()}</p>
                }
            </div>
        }
    }

    fn dialog_view(&self, ctx: &Context<Self>) -> Html {
        let score = self.engine.round().score();
        let content = match self.engine.phase() {
            game::Phase::Idle => {
                let step = self.intro_step.min(INTRO_STEPS.len() - 1);
                let (title, description) = INTRO_STEPS[step];
                let back = ctx.link().callback(move |_| Msg::IntroStep(step.saturating_sub(1)));
                let next = ctx.link().callback(move |_| Msg::IntroStep(step + 1));
                let start = ctx.link().callback(|_| Msg::Start);
                html! {
                    <>
                        <h2>{title}</h2>
                        <p>{description}</p>
                        <footer>
                            if step > 0 {
                                <button onclick={back}>{"Back"}</button>
                            }
                            if step + 1 < INTRO_STEPS.len() {
                                <button onclick={next}>{"Next"}</button>
                            } else {
                                <button onclick={start}>{"Start Game"}</button>
                            }
                        </footer>
                    </>
                }
            }
            game::Phase::Won => html! {
                <>
                    <h2>{"Congratulations!"}</h2>
                    <p>{"You found the correct image!"}</p>
                    <p class="score">{format!("Your Score: {score}")}</p>
                    <button onclick={ctx.link().callback(|_| Msg::Restart)}>{"Play Again"}</button>
                </>
            },
            game::Phase::Lost(reason) => {
                let why = match reason {
                    game::LossReason::OutOfChances => "You've run out of chances!",
                    game::LossReason::OutOfTime => "You've run out of time!",
                };
                html! {
                    <>
                        <h2>{"Game Over"}</h2>
                        <p>{why}</p>
                        <p class="score">{format!("Your Score: {score}")}</p>
                        <button onclick={ctx.link().callback(|_| Msg::Restart)}>{"Try Again"}</button>
                    </>
                }
            }
            _ => return html! {},
        };

        html! {
            <div class="dialog">
                <div class="backdrop"/>
                <section>{content}</section>
            </div>
        }
    }
}

impl Component for GameView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let props = ctx.props();
        let mut config = game::GameConfig::default();
        if let Some(threshold) = props.threshold {
            config = config.with_match_threshold(threshold);
        }
        let seed = props.seed.unwrap_or_else(js_random_seed);
        log::debug!("seed: {seed}, config: {config:?}");

        let grid = game::Grid::from_images(placeholder_images())
            .expect("placeholder images fill the grid");
        let services = Rc::new(Services::new(&ServiceSettings::load()));

        {
            let services = Rc::clone(&services);
            ctx.link().send_future(async move {
                use game::ImageSource;
                Msg::ImagesLoaded(services.database.fetch_random_images().await)
            });
        }

        Self {
            engine: game::GameEngine::new(config, grid, seed),
            services,
            text: String::new(),
            intro_step: 0,
            notice: None,
            notice_timeout: None,
            timers: TimerSlots::default(),
            in_flight: false,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        use Msg::*;

        match msg {
            IntroStep(step) => {
                self.intro_step = step;
            }
            Start => {
                if let Err(err) = self.engine.start() {
                    log::warn!("{err}");
                }
            }
            Restart => {
                if let Err(err) = self.engine.restart() {
                    log::warn!("{err}");
                }
            }
            Tick(ticket) => self.engine.tick(ticket),
            Input(text) => {
                self.text = text;
                return false;
            }
            Submit => self.submit(ctx),
            AttemptResolved(pending, outcome) => {
                self.in_flight = false;
                let outcome = self.engine.resolve_attempt(pending, outcome, utc_now());
                log::debug!("attempt resolved: {outcome:?}");
            }
            ImagesLoaded(Ok(images)) => {
                if let Err(err) = self.engine.load_images(images) {
                    log::warn!("keeping placeholder images: {err}");
                }
            }
            ImagesLoaded(Err(err)) => {
                log::warn!("could not fetch images: {err}");
            }
            DismissNotice => {
                self.notice_timeout = None;
                self.notice = None;
            }
        }

        self.apply_effects(ctx);
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="grid-waldo">
                {self.status_view()}
                <main>
                    {self.grid_view()}
                    {self.history_view()}
                </main>
                {self.answer_view(ctx)}
                {self.notice_view()}
                {self.dialog_view(ctx)}
            </div>
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_timer_has_its_own_slot() {
        use game::Timer::*;

        let mut slots = TimerSlots::default();
        for timer in [Countdown, Highlight, Clock, Cooldown] {
            assert!(slots.slot(timer).is_none());
        }
        slots.cancel(Clock);
        slots.cancel_all();
        assert!(slots.clock.is_none());
    }

    #[test]
    fn input_stays_closed_outside_an_active_round() {
        let images = placeholder_images();
        let grid = game::Grid::from_images(images).unwrap();
        let mut engine = game::GameEngine::new(game::GameConfig::default(), grid, 3);
        assert!(!input_open(&engine, false));

        engine.start().unwrap();
        for _ in 0..64 {
            if engine.phase().is_active() {
                break;
            }
            let tickets: Vec<_> = engine
                .drain_effects()
                .filter_map(|effect| match effect {
                    game::Effect::Schedule { ticket, .. } => Some(ticket),
                    _ => None,
                })
                .collect();
            for ticket in tickets {
                engine.tick(ticket);
            }
        }

        assert!(input_open(&engine, false));
        assert!(!input_open(&engine, true));
    }

    #[test]
    fn intro_ends_on_a_start_step() {
        let (title, _) = INTRO_STEPS[INTRO_STEPS.len() - 1];
        assert_eq!(title, "Ready?");
    }
}
