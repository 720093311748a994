/// Aggregate all-time PvP numbers for one player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PvPStatSnapshot {
    pub average_kill_distance: f64,
    pub average_lifespan_seconds: f64,
    pub kills_deaths_ratio: f64,
    pub win_loss_ratio: f64,
}

impl PvPStatSnapshot {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::KillDistance => self.average_kill_distance,
            Metric::Lifespan => self.average_lifespan_seconds,
            Metric::KillsDeaths => self.kills_deaths_ratio,
            Metric::WinLoss => self.win_loss_ratio,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    KillDistance,
    Lifespan,
    KillsDeaths,
    WinLoss,
}

impl Metric {
    /// Presentation order.
    pub const ALL: [Metric; 4] = [
        Metric::KillDistance,
        Metric::Lifespan,
        Metric::KillsDeaths,
        Metric::WinLoss,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Metric::KillDistance => "Average Kill Distance",
            Metric::Lifespan => "Average Lifespan",
            Metric::KillsDeaths => "Kills/Deaths Ratio",
            Metric::WinLoss => "Win/Loss Ratio",
        }
    }

    /// Key under `Response.allPvP.allTime` in the Bungie stats payload.
    pub fn stat_key(self) -> &'static str {
        match self {
            Metric::KillDistance => "averageKillDistance",
            Metric::Lifespan => "averageLifespan",
            Metric::KillsDeaths => "killsDeathsRatio",
            Metric::WinLoss => "winLossRatio",
        }
    }

    /// Inclusive bounds of the middle band.
    pub fn bounds(self) -> (f64, f64) {
        match self {
            Metric::KillDistance => (10.0, 20.0),
            Metric::Lifespan => (60.0, 120.0),
            Metric::KillsDeaths => (1.0, 1.5),
            Metric::WinLoss => (0.5, 1.0),
        }
    }

    pub fn band(self, value: f64) -> Band {
        let (low, high) = self.bounds();
        if value < low {
            Band::Low
        } else if value <= high {
            Band::Middle
        } else {
            Band::High
        }
    }

    pub fn suggestion(self, band: Band) -> &'static str {
        match (self, band) {
            (Metric::KillDistance, Band::Low) => {
                "Try to engage at longer distances to improve safety and efficiency."
            }
            (Metric::KillDistance, Band::Middle) => {
                "Your engagement distance is average, consider practicing your precision aiming."
            }
            (Metric::KillDistance, Band::High) => {
                "Great job on maintaining a safe engagement distance!"
            }
            (Metric::Lifespan, Band::Low) => {
                "Work on your positioning and map awareness to stay alive longer."
            }
            (Metric::Lifespan, Band::Middle) => {
                "You have a decent lifespan. Consider tweaking your gear or abilities for better survival."
            }
            (Metric::Lifespan, Band::High) => "Excellent survival skills!",
            (Metric::KillsDeaths, Band::Low) => {
                "Focus on reducing deaths by playing more conservatively."
            }
            (Metric::KillsDeaths, Band::Middle) => {
                "Your K/D is solid! Try to push for more aggressive plays safely to increase it further."
            }
            (Metric::KillsDeaths, Band::High) => {
                "Excellent K/D ratio! Keep up the aggressive play while maintaining your current strategy."
            }
            (Metric::WinLoss, Band::Low) => {
                "Your win rate is quite low; consider teaming up with friends or other players to improve teamwork."
            }
            (Metric::WinLoss, Band::Middle) => {
                "You have an average win rate. Focus on strategic plays and objective control to improve your win rate."
            }
            (Metric::WinLoss, Band::High) => {
                "Great win rate! Your team play and strategy are paying off well."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Low,
    Middle,
    High,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Advice {
    pub metric: Metric,
    pub value: f64,
    pub band: Band,
    pub suggestion: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryReport {
    pub entries: Vec<Advice>,
}

impl AdvisoryReport {
    pub fn suggestions(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|a| a.suggestion)
    }
}

/// Bands every metric independently; always one entry per metric in
/// `Metric::ALL` order.
pub fn advise(snapshot: &PvPStatSnapshot) -> AdvisoryReport {
    let entries = Metric::ALL
        .iter()
        .map(|&metric| {
            let value = snapshot.value(metric);
            let band = metric.band(value);
            Advice {
                metric,
                value,
                band,
                suggestion: metric.suggestion(band),
            }
        })
        .collect();
    AdvisoryReport { entries }
}
