use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Filtering,
    Normalization,
    Scoring,
    Frontier,
    Explanation,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Filtering => "Applying constraints",
            Self::Normalization => "Normalizing objectives",
            Self::Scoring => "Scoring candidates",
            Self::Frontier => "Computing Pareto frontier",
            Self::Explanation => "Explaining recommendations",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    StageStart { stage: Stage },
    /// `survivors` is the number of candidates still in play after the stage.
    StageFinish { stage: Stage, survivors: usize },
    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reporter_without_callback_is_silent() {
        ProgressReporter::new().report(Progress::Message("ignored".to_string()));
    }

    #[test]
    fn reporter_forwards_events_in_order() {
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            events.lock().unwrap().push(event);
        }));

        reporter.report(Progress::StageStart {
            stage: Stage::Filtering,
        });
        reporter.report(Progress::StageFinish {
            stage: Stage::Filtering,
            survivors: 3,
        });
        drop(reporter);

        let events = events.into_inner().unwrap();
        assert_eq!(
            events,
            vec![
                Progress::StageStart {
                    stage: Stage::Filtering
                },
                Progress::StageFinish {
                    stage: Stage::Filtering,
                    survivors: 3
                },
            ]
        );
    }
}
