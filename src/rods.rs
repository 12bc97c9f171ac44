//! Control and moderator rods.
//!
//! Every rod rides a single vertical axis between its origin height (fully
//! inserted) and origin + max raise distance (fully withdrawn). Rods move at
//! constant speed from the moment they are commanded until they are halted;
//! reaching either end just clamps the position.
//!
//! Control rods absorb slow neutrons. Moderator rods bounce fast neutrons
//! and thermalise them.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{AssemblyLayout, RodParams};
use crate::geometry::{Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RodClass {
    Control,
    Moderator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RodDirection {
    Raise,
    Lower,
}

/// Tri-state drive command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RodCommand {
    Raise,
    Lower,
    Halt,
}

/// Bounded 1-D position integrator for a single rod.
#[derive(Debug, Clone)]
pub struct RodMovementController {
    origin_height: f64,
    max_height: f64,
    speed: f64,
    height: f64,
    moving: bool,
    direction: RodDirection,
}

impl RodMovementController {
    pub fn new(origin_height: f64, max_raise_distance: f64, speed: f64) -> Self {
        Self {
            origin_height,
            max_height: origin_height + max_raise_distance,
            speed,
            height: origin_height,
            moving: false,
            direction: RodDirection::Lower,
        }
    }

    pub fn begin(&mut self, direction: RodDirection) {
        self.moving = true;
        self.direction = direction;
    }

    /// Stop moving. The idle direction falls back to lowering.
    pub fn stop(&mut self) {
        self.moving = false;
        self.direction = RodDirection::Lower;
    }

    pub fn integrate(&mut self, dt: f64) {
        if !self.moving {
            return;
        }
        let sign = match self.direction {
            RodDirection::Raise => 1.0,
            RodDirection::Lower => -1.0,
        };
        self.height =
            (self.height + sign * self.speed * dt).clamp(self.origin_height, self.max_height);
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn origin_height(&self) -> f64 {
        self.origin_height
    }

    pub fn max_height(&self) -> f64 {
        self.max_height
    }

    /// Distance withdrawn above the origin.
    pub fn offset(&self) -> f64 {
        self.height - self.origin_height
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn direction(&self) -> RodDirection {
        self.direction
    }
}

/// Placement of one rod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RodSpec {
    pub class: RodClass,
    /// Horizontal centre.
    pub x: f64,
    /// Bottom edge when fully inserted.
    pub origin_height: f64,
    pub width: f64,
    pub length: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RodLayout {
    pub rods: Vec<RodSpec>,
}

impl RodLayout {
    /// One rod in every gap between neighbouring fuel columns, alternating
    /// moderator and control, each covering the whole assembly height when
    /// fully inserted.
    pub fn interleaved(layout: &AssemblyLayout, width_fraction: f64) -> Self {
        let spacing = layout.spacing();
        let origin_height = layout.min.y - spacing.y / 2.0;
        let length = (layout.max.y - layout.min.y) + spacing.y;
        let rods = (0..layout.columns.saturating_sub(1))
            .map(|gap| RodSpec {
                class: if gap % 2 == 0 {
                    RodClass::Moderator
                } else {
                    RodClass::Control
                },
                x: layout.min.x + spacing.x * (gap as f64 + 0.5),
                origin_height,
                width: spacing.x * width_fraction,
                length,
            })
            .collect();
        Self { rods }
    }
}

#[derive(Debug, Clone)]
pub struct Rod {
    class: RodClass,
    x: f64,
    width: f64,
    length: f64,
    drive: RodMovementController,
}

impl Rod {
    pub fn new(spec: &RodSpec, params: &RodParams) -> Self {
        Self {
            class: spec.class,
            x: spec.x,
            width: spec.width,
            length: spec.length,
            drive: RodMovementController::new(
                spec.origin_height,
                params.max_raise_distance,
                params.speed,
            ),
        }
    }

    pub fn class(&self) -> RodClass {
        self.class
    }

    pub fn drive(&self) -> &RodMovementController {
        &self.drive
    }

    pub fn bounds(&self) -> Rect {
        let bottom = self.drive.height();
        Rect::new(
            Vec2::new(self.x - self.width / 2.0, bottom),
            Vec2::new(self.x + self.width / 2.0, bottom + self.length),
        )
    }
}

/// Movement status of one rod class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RodGroupStatus {
    pub enabled: bool,
    pub moving: bool,
    /// Meaningful only while `moving`.
    pub raising: bool,
    pub rod_count: usize,
}

#[derive(Debug, Clone)]
struct RodGroup {
    rods: Vec<Rod>,
    status: RodGroupStatus,
}

impl RodGroup {
    fn new(rods: Vec<Rod>, enabled: bool) -> Self {
        let rod_count = rods.len();
        Self {
            rods,
            status: RodGroupStatus {
                enabled: enabled && rod_count > 0,
                moving: false,
                raising: false,
                rod_count,
            },
        }
    }

    /// Returns true when the group's movement status changed.
    fn command(&mut self, command: RodCommand) -> bool {
        if !self.status.enabled {
            return false;
        }
        let (moving, raising) = match command {
            RodCommand::Raise => (true, true),
            RodCommand::Lower => (true, false),
            RodCommand::Halt => (false, false),
        };
        for rod in &mut self.rods {
            match command {
                RodCommand::Raise => rod.drive.begin(RodDirection::Raise),
                RodCommand::Lower => rod.drive.begin(RodDirection::Lower),
                RodCommand::Halt => rod.drive.stop(),
            }
        }
        let changed = self.status.moving != moving || self.status.raising != raising;
        self.status.moving = moving;
        self.status.raising = raising;
        changed
    }
}

/// Both rod classes and their drive commands.
#[derive(Debug, Clone)]
pub struct RodArrayController {
    control: RodGroup,
    moderator: RodGroup,
}

impl RodArrayController {
    /// Build from a layout. A class with no rods is forced disabled.
    pub fn from_layout(
        layout: &RodLayout,
        params: &RodParams,
        enable_control: bool,
        enable_moderator: bool,
    ) -> Self {
        let of_class = |class: RodClass| {
            layout
                .rods
                .iter()
                .filter(|spec| spec.class == class)
                .map(|spec| Rod::new(spec, params))
                .collect::<Vec<_>>()
        };
        Self {
            control: RodGroup::new(of_class(RodClass::Control), enable_control),
            moderator: RodGroup::new(of_class(RodClass::Moderator), enable_moderator),
        }
    }

    fn group(&self, class: RodClass) -> &RodGroup {
        match class {
            RodClass::Control => &self.control,
            RodClass::Moderator => &self.moderator,
        }
    }

    fn group_mut(&mut self, class: RodClass) -> &mut RodGroup {
        match class {
            RodClass::Control => &mut self.control,
            RodClass::Moderator => &mut self.moderator,
        }
    }

    /// Drive every rod of `class`. Ignored while that class is disabled.
    pub fn command(&mut self, class: RodClass, command: RodCommand) {
        if self.group_mut(class).command(command) {
            debug!("{:?} rods: {:?}", class, command);
        }
    }

    pub fn raise_control_rods(&mut self) {
        self.command(RodClass::Control, RodCommand::Raise);
    }

    pub fn lower_control_rods(&mut self) {
        self.command(RodClass::Control, RodCommand::Lower);
    }

    pub fn halt_control_rods(&mut self) {
        self.command(RodClass::Control, RodCommand::Halt);
    }

    pub fn raise_moderator_rods(&mut self) {
        self.command(RodClass::Moderator, RodCommand::Raise);
    }

    pub fn lower_moderator_rods(&mut self) {
        self.command(RodClass::Moderator, RodCommand::Lower);
    }

    pub fn halt_moderator_rods(&mut self) {
        self.command(RodClass::Moderator, RodCommand::Halt);
    }

    /// Enable or disable a class. Disabling halts it first; a class without
    /// rods stays disabled.
    pub fn set_enabled(&mut self, class: RodClass, enabled: bool) {
        if !enabled {
            self.command(class, RodCommand::Halt);
        }
        let group = self.group_mut(class);
        group.status.enabled = enabled && group.status.rod_count > 0;
        debug!("{:?} rods enabled: {}", class, group.status.enabled);
    }

    pub fn is_enabled(&self, class: RodClass) -> bool {
        self.group(class).status.enabled
    }

    pub fn status(&self, class: RodClass) -> RodGroupStatus {
        self.group(class).status
    }

    pub fn rods(&self, class: RodClass) -> &[Rod] {
        &self.group(class).rods
    }

    pub fn integrate(&mut self, dt: f64) {
        for rod in self.control.rods.iter_mut().chain(self.moderator.rods.iter_mut()) {
            rod.drive.integrate(dt);
        }
    }

    /// Whether a circle at `position` touches any control rod.
    pub fn touches_control_rod(&self, position: Vec2, radius: f64) -> bool {
        self.control
            .rods
            .iter()
            .any(|rod| rod.bounds().overlaps_circle(position, radius))
    }

    /// Whether a circle at `position` touches any moderator rod.
    pub fn touches_moderator_rod(&self, position: Vec2, radius: f64) -> bool {
        self.moderator
            .rods
            .iter()
            .any(|rod| rod.bounds().overlaps_circle(position, radius))
    }
}
