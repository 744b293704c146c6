use std::time::Duration;

use iced::keyboard::{self, Key};
use iced::widget::{column, container, image, text};
use iced::{event, ContentFit, Element, Event, Length, Subscription, Task};

use proctor_core::pipeline::capture_loop_use_case::{CaptureSummary, StopReason};

use crate::worker::{MonitorHandle, WorkerEvent};

/// How often the window checks for a new frame (~60 fps).
const FRAME_POLL_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone)]
pub enum Message {
    Tick,
    QuitPressed,
}

pub struct App {
    worker: MonitorHandle,
    frame: Option<image::Handle>,
    frames_shown: usize,
    status: String,
    /// Close the window once the worker stops on its own. Off for still images.
    close_on_stop: bool,
}

impl App {
    pub fn new(worker: MonitorHandle, close_on_stop: bool) -> (Self, Task<Message>) {
        (
            Self {
                worker,
                frame: None,
                frames_shown: 0,
                status: "Waiting for camera...".into(),
                close_on_stop,
            },
            Task::none(),
        )
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => {
                if let Ok(frame) = self.worker.frames.try_recv() {
                    self.frame = Some(image::Handle::from_rgba(
                        frame.width(),
                        frame.height(),
                        frame.to_rgba(),
                    ));
                    self.frames_shown += 1;
                    self.status = format!("Frame {} \u{00b7} press q to quit", frame.index());
                }
                if let Ok(event) = self.worker.events.try_recv() {
                    let close = closes_window(&event, self.close_on_stop);
                    self.status = match event {
                        WorkerEvent::Stopped(summary) => match summary.stop {
                            StopReason::SourceExhausted => {
                                format!("Camera stream ended after {} frames", summary.frames)
                            }
                            StopReason::QuitRequested => "Stopped".into(),
                        },
                        WorkerEvent::Failed(e) => format!("Capture stopped: {e}"),
                    };
                    if close {
                        log::info!("{}, closing window", self.status);
                        return iced::exit();
                    }
                }
            }
            Message::QuitPressed => {
                log::info!("Quit requested after {} frames shown", self.frames_shown);
                self.worker.request_quit();
                return iced::exit();
            }
        }
        Task::none()
    }

    pub fn view(&self) -> Element<'_, Message> {
        let feed: Element<'_, Message> = match &self.frame {
            Some(handle) => image(handle.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => container(text("No frame yet"))
                .center(Length::Fill)
                .into(),
        };

        column![feed, container(text(&self.status).size(13)).padding([4, 8])]
            .height(Length::Fill)
            .into()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            iced::time::every(FRAME_POLL_INTERVAL).map(|_| Message::Tick),
            event::listen_with(quit_key),
        ])
    }
}

fn quit_key(event: Event, _status: event::Status, _window: iced::window::Id) -> Option<Message> {
    match event {
        Event::Keyboard(keyboard::Event::KeyPressed { key, .. }) if is_quit_key(&key) => {
            Some(Message::QuitPressed)
        }
        _ => None,
    }
}

/// Only a lowercase `q` quits; `Q` (shift held) is ignored.
fn is_quit_key(key: &Key) -> bool {
    matches!(key, Key::Character(c) if c.as_str() == "q")
}

fn closes_window(event: &WorkerEvent, close_on_stop: bool) -> bool {
    close_on_stop
        && matches!(
            event,
            WorkerEvent::Failed(_)
                | WorkerEvent::Stopped(CaptureSummary {
                    stop: StopReason::SourceExhausted,
                    ..
                })
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use iced::keyboard::key::Named;

    fn stopped(stop: StopReason) -> WorkerEvent {
        WorkerEvent::Stopped(CaptureSummary { frames: 3, stop })
    }

    #[test]
    fn test_lowercase_q_quits() {
        assert!(is_quit_key(&Key::Character("q".into())));
    }

    #[test]
    fn test_other_keys_do_not_quit() {
        assert!(!is_quit_key(&Key::Character("Q".into())));
        assert!(!is_quit_key(&Key::Character("w".into())));
        assert!(!is_quit_key(&Key::Named(Named::Escape)));
    }

    #[test]
    fn test_camera_end_closes_window() {
        assert!(closes_window(&stopped(StopReason::SourceExhausted), true));
        assert!(closes_window(&WorkerEvent::Failed("unplugged".into()), true));
    }

    #[test]
    fn test_still_image_keeps_window_open() {
        assert!(!closes_window(&stopped(StopReason::SourceExhausted), false));
        assert!(!closes_window(&WorkerEvent::Failed("bad file".into()), false));
    }

    #[test]
    fn test_quit_request_is_not_a_second_exit() {
        assert!(!closes_window(&stopped(StopReason::QuitRequested), true));
    }
}
