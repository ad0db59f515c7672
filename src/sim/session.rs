//! Game controller
//!
//! `Session` owns all mutable game state: the physics world, the scene graph,
//! placement, balls, score and pending timers. The platform feeds it
//! `InputEvent`s and calls `frame()` once per animation frame; it answers with
//! `GameEvent`s for audio and UI.
//!
//! Frame order: camera pose, reticle, timers, physics step, ground contacts,
//! body -> node sync, scoring, retirement. Rendering happens afterwards in the
//! platform layer.

use glam::{Quat, Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::scoring::{ScoreState, points_for_distance};
use super::state::{
    Ball, Basket, CHEER_VARIANTS, GameEvent, InputEvent, Placement, Sound, SwipeGesture, Timer,
    TimerKind,
};
use super::throw::{aim_direction, launch_velocity};
use crate::ar::{ArSession, CameraFrame, SurfaceHit};
use crate::consts::{
    HIDDEN_POSITION, READY_BALL_OFFSET, RETICLE_EASING, RETICLE_INNER_RADIUS,
    RETICLE_OUTER_RADIUS,
};
use crate::error::GameError;
use crate::normalize_screen;
use crate::physics::{Body, BodyHandle, Shape, World};
use crate::renderer::scene::{Anchor, BodyLink, Mesh, Node, NodeId, Scene};
use crate::settings::Settings;

const INTRO_MESSAGE: &str = "tap anywhere to start, then tap a surface to place the bin";
const PLACED_MESSAGE: &str =
    "bin has been placed, you can now lock this position and begin throwing. (⌐■_■)";

/// One game, from first touch to page unload
pub struct Session {
    settings: Settings,
    world: World,
    scene: Scene,
    ground: BodyHandle,
    basket: Option<Basket>,
    basket_node: NodeId,
    reticle: NodeId,
    placement: Placement,
    /// First touch only starts the game
    started: bool,
    /// Ball slots; retired slots stay `None`
    balls: Vec<Option<Ball>>,
    next_ball_id: u32,
    score: ScoreState,
    swipe_start: Option<(Vec2, f64)>,
    timers: Vec<Timer>,
    message_generation: u32,
    message_visible: bool,
    events: Vec<GameEvent>,
    camera: Option<CameraFrame>,
    now_ms: f64,
    rng: Pcg32,
}

impl Session {
    pub fn new(settings: Settings, seed: u64) -> Self {
        let settings = settings.sanitized();
        let mut world = World::new(settings.gravity_vector(), settings.physics_dt);
        let ground = world.add_body(Body::fixed(Shape::Plane));

        let mut scene = Scene::new();
        let basket_node = scene.add(
            Node::new(Mesh::Basket {
                radius: settings.basket_radius,
                height: settings.basket_height,
                segments: settings.basket_segments,
            })
            .hidden(),
        );
        // Visible but parked until the first surface hit
        let reticle = scene.add(
            Node::new(Mesh::Reticle {
                inner: RETICLE_INNER_RADIUS,
                outer: RETICLE_OUTER_RADIUS,
            })
            .at(HIDDEN_POSITION),
        );

        let mut session = Self {
            score: ScoreState::new(settings.miss_threshold),
            settings,
            world,
            scene,
            ground,
            basket: None,
            basket_node,
            reticle,
            placement: Placement::Unplaced,
            started: false,
            balls: Vec::new(),
            next_ball_id: 1,
            swipe_start: None,
            timers: Vec::new(),
            message_generation: 0,
            message_visible: false,
            events: Vec::new(),
            camera: None,
            now_ms: 0.0,
            rng: Pcg32::seed_from_u64(seed),
        };
        session.show_message(INTRO_MESSAGE.to_string(), false);
        session
    }

    // === Accessors ===

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn basket(&self) -> Option<&Basket> {
        self.basket.as_ref()
    }

    pub fn basket_node(&self) -> NodeId {
        self.basket_node
    }

    pub fn reticle(&self) -> NodeId {
        self.reticle
    }

    pub fn score(&self) -> &ScoreState {
        &self.score
    }

    pub fn camera(&self) -> Option<&CameraFrame> {
        self.camera.as_ref()
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Live balls, oldest first
    pub fn balls(&self) -> impl Iterator<Item = &Ball> {
        self.balls.iter().flatten()
    }

    /// The ball waiting in front of the camera, if any
    pub fn ready_ball(&self) -> Option<&Ball> {
        self.balls().find(|b| b.is_ready())
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, GameEvent> {
        self.events.drain(..)
    }

    // === Input ===

    /// Apply one input event. Rejected actions never fail loudly: errors the
    /// player should see become banner messages, the rest are logged.
    pub fn handle_input(&mut self, ar: &mut dyn ArSession, event: InputEvent) {
        let result = match event {
            InputEvent::TouchStart {
                page,
                viewport,
                timestamp,
            } => self.touch_start(ar, page, viewport, timestamp),
            InputEvent::TouchEnd {
                page,
                viewport,
                timestamp,
            } => self.touch_end(page, viewport, timestamp).map(|_| ()),
            InputEvent::ToggleLock => self.toggle_lock().map(|_| ()),
            InputEvent::DismissMessage => {
                self.hide_message();
                Ok(())
            }
            InputEvent::SoundFinished(sound) => {
                self.sound_finished(sound);
                Ok(())
            }
        };

        if let Err(err) = result {
            if err.is_user_visible() {
                self.show_message(err.to_string(), true);
            } else {
                log::debug!("Ignored {:?}: {}", event, err);
            }
        }
    }

    fn touch_start(
        &mut self,
        ar: &mut dyn ArSession,
        page: Vec2,
        viewport: Vec2,
        timestamp: f64,
    ) -> Result<(), GameError> {
        self.hide_message();

        if !self.started {
            self.started = true;
            log::info!("Game started");
            return Ok(());
        }

        self.swipe_start = Some((page, timestamp));

        if self.placement != Placement::Locked {
            self.place_basket(ar, normalize_screen(page, viewport))?;
        }
        Ok(())
    }

    fn touch_end(
        &mut self,
        page: Vec2,
        viewport: Vec2,
        timestamp: f64,
    ) -> Result<BodyHandle, GameError> {
        let (start, start_time) = self.swipe_start.take().ok_or(GameError::InvalidSwipe)?;
        let swipe = SwipeGesture {
            start,
            start_time,
            end: page,
            end_time: timestamp,
        };
        self.throw_ball(&swipe, normalize_screen(page, viewport))
    }

    fn sound_finished(&mut self, sound: Sound) {
        if let Sound::Taunt { stage } = sound {
            if self.score.end_taunt() {
                log::info!("Taunt {} finished, throwing resumed", stage);
                self.events.push(GameEvent::TauntEnded);
            }
        }
    }

    // === Placement ===

    /// Hit-test a viewport-normalized point and put the basket there. A miss
    /// removes the current basket.
    pub fn place_basket(
        &mut self,
        ar: &mut dyn ArSession,
        screen: Vec2,
    ) -> Result<(), GameError> {
        if self.placement == Placement::Locked {
            return Err(GameError::BasketLocked);
        }

        let hits = ar.hit_test(screen.x, screen.y);
        let Some(hit) = hits.first().copied() else {
            self.destroy_basket();
            self.placement = Placement::Unplaced;
            log::info!("No surface at ({:.2}, {:.2})", screen.x, screen.y);
            return Err(GameError::NoSurfaceHit);
        };

        self.clear_all_balls();
        self.destroy_basket();
        self.build_basket(hit);

        if let Some(ground) = self.world.body_mut(self.ground) {
            ground.position = hit.position;
        }

        self.placement = Placement::Unlocked;
        log::info!("Basket placed at {:?}", hit.position);
        self.show_message(PLACED_MESSAGE.to_string(), true);
        Ok(())
    }

    fn build_basket(&mut self, hit: SurfaceHit) {
        let SurfaceHit {
            position,
            orientation,
        } = hit;
        let geometry = self.settings.basket_dims().geometry();

        let frame = self.world.add_body(
            Body::fixed(Shape::Polyhedron(geometry.frame))
                .with_position(position + orientation * geometry.frame_offset)
                .with_rotation(orientation * geometry.frame_rotation),
        );

        let walls = geometry
            .walls
            .iter()
            .map(|wall| {
                let handle = self.world.add_body(
                    Body::fixed(Shape::Cuboid {
                        half_extents: wall.half_extents,
                    })
                    .with_position(position + orientation * wall.offset)
                    .with_rotation(orientation * wall.rotation),
                );
                (wall.side, handle)
            })
            .collect();

        if let Some(node) = self.scene.get_mut(self.basket_node) {
            node.position = position;
            node.rotation = orientation;
            node.visible = true;
            node.link = Some(BodyLink {
                body: frame,
                local_position: geometry.frame_offset,
                local_rotation: geometry.frame_rotation,
            });
        }

        self.basket = Some(Basket {
            position,
            orientation,
            frame,
            walls,
        });
    }

    /// Remove the basket's bodies and hide its mesh
    fn destroy_basket(&mut self) {
        if let Some(basket) = self.basket.take() {
            for handle in basket.bodies() {
                self.world.remove_body(handle);
            }
        }
        if let Some(node) = self.scene.get_mut(self.basket_node) {
            node.link = None;
        }
        self.scene.hide(self.basket_node);
    }

    /// Lock or unlock the basket. Returns the new lock state.
    pub fn toggle_lock(&mut self) -> Result<bool, GameError> {
        match self.placement {
            Placement::Unplaced => Err(GameError::BasketNotPlaced),
            Placement::Unlocked => {
                self.placement = Placement::Locked;
                self.scene.hide(self.reticle);
                self.arm_ball();
                log::info!("Basket locked");
                self.events.push(GameEvent::LockChanged(true));
                Ok(true)
            }
            Placement::Locked => {
                self.placement = Placement::Unlocked;
                self.disarm();
                if self.score.end_taunt() {
                    self.events.push(GameEvent::TauntEnded);
                }
                self.scene.show(self.reticle);
                log::info!("Basket unlocked");
                self.events.push(GameEvent::LockChanged(false));
                Ok(false)
            }
        }
    }

    // === Balls ===

    /// Put a fresh ball in front of the camera. No-op unless locked with no
    /// ball already waiting.
    fn arm_ball(&mut self) -> bool {
        if self.placement != Placement::Locked || self.ready_ball().is_some() {
            return false;
        }
        let node = self.scene.add(
            Node::new(Mesh::Ball {
                radius: self.settings.ball_radius,
            })
            .at(READY_BALL_OFFSET)
            .anchored(Anchor::Camera),
        );
        let id = self.next_ball_id;
        self.next_ball_id += 1;
        self.balls.push(Some(Ball::new(id, node)));
        log::debug!("Ball {} ready", id);
        true
    }

    /// Drop the waiting ball, if any
    fn disarm(&mut self) {
        for slot in self.balls.iter_mut() {
            if slot.as_ref().is_some_and(|b| b.is_ready()) {
                if let Some(ball) = slot.take() {
                    self.scene.remove(ball.node);
                }
            }
        }
    }

    fn clear_all_balls(&mut self) {
        for ball in self.balls.drain(..).flatten() {
            if let Some(body) = ball.body {
                self.world.remove_body(body);
            }
            self.scene.remove(ball.node);
        }
    }

    /// Launch the ready ball along the ray through `release` (viewport
    /// normalized) with a speed derived from the swipe.
    pub fn throw_ball(
        &mut self,
        swipe: &SwipeGesture,
        release: Vec2,
    ) -> Result<BodyHandle, GameError> {
        if self.placement != Placement::Locked {
            return Err(GameError::BasketUnlocked);
        }
        if self.score.paused {
            return Err(GameError::ThrowsPaused);
        }
        let slot = self
            .balls
            .iter()
            .position(|b| b.as_ref().is_some_and(|b| b.is_ready()))
            .ok_or(GameError::NoReadyBall)?;
        let velocity = swipe.velocity().ok_or(GameError::InvalidSwipe)?;
        let camera = self.camera.ok_or(GameError::NotTracking)?;

        let (_, ray) = camera.screen_ray(release);
        let direction = aim_direction(ray, camera.forward());

        let ball = self.balls[slot].as_mut().ok_or(GameError::NoReadyBall)?;
        let (position, rotation) = self
            .scene
            .detach_from_camera(ball.node, &camera)
            .ok_or(GameError::NoReadyBall)?;

        let body = self.world.add_body(
            Body::dynamic(
                Shape::Sphere {
                    radius: self.settings.ball_radius,
                },
                self.settings.ball_mass,
            )
            .with_restitution(self.settings.ball_restitution)
            .with_friction(self.settings.ball_friction)
            .with_damping(self.settings.ball_damping)
            .with_position(position)
            .with_rotation(rotation)
            .with_velocity(launch_velocity(
                direction,
                velocity,
                self.settings.throw_power,
                self.settings.throw_lift,
            )),
        );
        if let Some(node) = self.scene.get_mut(ball.node) {
            node.link = Some(BodyLink::new(body));
        }
        ball.body = Some(body);
        ball.throw_distance = self
            .basket
            .as_ref()
            .map(|basket| position.distance(basket.position))
            .unwrap_or(0.0);

        log::info!(
            "Ball {} thrown: swipe {:.0}px in {:.0}ms, speed {:.3}, distance {:.2}m",
            ball.id,
            swipe.distance(),
            swipe.elapsed(),
            velocity,
            ball.throw_distance
        );

        self.timers.push(Timer {
            due_ms: self.now_ms + self.settings.respawn_delay_ms,
            kind: TimerKind::ArmBall,
        });
        self.events.push(GameEvent::PlaySound(Sound::Throw));
        Ok(body)
    }

    // === Messages ===

    fn show_message(&mut self, text: String, auto_hide: bool) {
        self.message_generation = self.message_generation.wrapping_add(1);
        self.message_visible = true;
        if auto_hide {
            self.timers.push(Timer {
                due_ms: self.now_ms + self.settings.message_timeout_ms,
                kind: TimerKind::HideMessage {
                    generation: self.message_generation,
                },
            });
        }
        self.events.push(GameEvent::ShowMessage {
            text,
            generation: self.message_generation,
        });
    }

    fn hide_message(&mut self) {
        if self.message_visible {
            self.message_visible = false;
            self.events.push(GameEvent::HideMessage);
        }
    }

    // === Frame ===

    /// Advance one animation frame
    pub fn frame(&mut self, ar: &mut dyn ArSession, now_ms: f64) {
        self.now_ms = now_ms;
        if let Some(camera) = ar.frame() {
            self.camera = Some(camera);
        }

        self.update_reticle(ar);
        self.fire_timers();
        self.world.step();
        self.handle_collisions();
        self.scene.sync_from_physics(&self.world);
        self.check_scoring();
        self.retire_balls();
    }

    /// Follow the surface under the screen centre while unlocked
    fn update_reticle(&mut self, ar: &mut dyn ArSession) {
        if self.placement == Placement::Locked {
            return;
        }
        let Some(hit) = ar.hit_test(0.5, 0.5).first().copied() else {
            return;
        };
        let Some(node) = self.scene.get_mut(self.reticle) else {
            return;
        };
        if node.position == HIDDEN_POSITION {
            node.position = hit.position;
            node.rotation = hit.orientation;
        } else {
            node.position = node.position.lerp(hit.position, RETICLE_EASING);
            node.rotation = node.rotation.slerp(hit.orientation, RETICLE_EASING);
        }
        node.visible = true;
    }

    fn fire_timers(&mut self) {
        let now = self.now_ms;
        let (mut due, pending): (Vec<Timer>, Vec<Timer>) = std::mem::take(&mut self.timers)
            .into_iter()
            .partition(|t| t.due_ms <= now);
        self.timers = pending;
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms));

        for timer in due {
            match timer.kind {
                TimerKind::ArmBall => {
                    self.arm_ball();
                }
                TimerKind::HideMessage { generation } => {
                    if generation == self.message_generation {
                        self.hide_message();
                    }
                }
            }
        }
    }

    /// A ball touching the ground before it scored is a miss
    fn handle_collisions(&mut self) {
        let ground = self.ground;
        let touched: Vec<BodyHandle> = self
            .world
            .drain_collisions()
            .filter(|e| e.other == ground)
            .map(|e| e.body)
            .collect();

        for body in touched {
            let linger = self.settings.ball_linger_ms;
            let now = self.now_ms;
            let Some(ball) = self
                .balls
                .iter_mut()
                .flatten()
                .find(|b| b.body == Some(body))
            else {
                continue;
            };
            if !ball.mark_miss() {
                continue;
            }
            ball.retire_at_ms = Some(now + linger);
            let id = ball.id;
            self.register_miss(id);
        }
    }

    fn register_miss(&mut self, ball_id: u32) {
        let taunt = self.score.record_miss();
        let streak = self.score.consecutive_misses;
        log::info!("Ball {} missed, streak {}", ball_id, streak);
        self.events.push(GameEvent::PlaySound(Sound::Miss));
        self.events.push(GameEvent::Missed { streak });

        if let Some(stage) = taunt {
            log::info!("Taunt stage {} started, throwing paused", stage);
            self.events.push(GameEvent::TauntStarted(stage));
            self.events.push(GameEvent::PlaySound(Sound::Taunt { stage }));
        }
    }

    /// Score every live ball inside the basket volume
    fn check_scoring(&mut self) {
        let Some(basket) = self.basket.as_ref() else {
            return;
        };
        let bounds = self
            .settings
            .basket_dims()
            .bounds(basket.position, basket.orientation);

        let mut scored = Vec::new();
        for ball in self.balls.iter_mut().flatten() {
            if ball.is_scored() {
                continue;
            }
            let Some(position) = ball.body.and_then(|h| self.world.body(h)).map(|b| b.position)
            else {
                continue;
            };
            if !bounds.contains(position) {
                continue;
            }
            let points = points_for_distance(ball.throw_distance);
            if ball.mark_hit(points) {
                ball.retire_at_ms = Some(self.now_ms + self.settings.ball_linger_ms);
                scored.push((ball.id, points));
            }
        }

        for (id, points) in scored {
            self.score.record_hit(points);
            log::info!("Ball {} scored {} points, total {}", id, points, self.score.total);
            let cheer = self.rng.random_range(0..CHEER_VARIANTS);
            self.events.push(GameEvent::ScoreChanged {
                total: self.score.total,
                points,
            });
            self.events.push(GameEvent::PlaySound(Sound::Cheer(cheer)));
            self.show_message(format!("nice shot! +{} (⌐■_■)", points), true);
        }
    }

    /// Remove balls whose linger time is over
    fn retire_balls(&mut self) {
        let now = self.now_ms;
        for slot in self.balls.iter_mut() {
            let expired = slot
                .as_ref()
                .and_then(|b| b.retire_at_ms)
                .is_some_and(|at| at <= now);
            if !expired {
                continue;
            }
            if let Some(ball) = slot.take() {
                if let Some(body) = ball.body {
                    self.world.remove_body(body);
                }
                self.scene.remove(ball.node);
                log::debug!("Ball {} retired", ball.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ar::FloorSession;
    use std::f32::consts::FRAC_PI_2;

    const VIEWPORT: Vec2 = Vec2::new(360.0, 640.0);
    const FRAME_MS: f64 = 1000.0 / 60.0;

    /// Camera one metre above the floor looking straight down
    fn overhead() -> FloorSession {
        let mut ar = FloorSession::new(1.0, VIEWPORT.x / VIEWPORT.y);
        ar.set_pose(Vec3::new(0.0, 1.0, 0.0), Quat::from_rotation_x(-FRAC_PI_2));
        ar
    }

    fn run(session: &mut Session, ar: &mut FloorSession, frames: usize) {
        for _ in 0..frames {
            let now = session.now_ms() + FRAME_MS;
            session.frame(ar, now);
        }
    }

    fn touch_start(session: &mut Session, ar: &mut FloorSession, page: Vec2, timestamp: f64) {
        session.handle_input(
            ar,
            InputEvent::TouchStart {
                page,
                viewport: VIEWPORT,
                timestamp,
            },
        );
    }

    fn touch_end(session: &mut Session, ar: &mut FloorSession, page: Vec2, timestamp: f64) {
        session.handle_input(
            ar,
            InputEvent::TouchEnd {
                page,
                viewport: VIEWPORT,
                timestamp,
            },
        );
    }

    fn messages(session: &mut Session) -> Vec<String> {
        session
            .drain_events()
            .filter_map(|e| match e {
                GameEvent::ShowMessage { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Started, basket placed under the screen centre and locked
    fn locked_session() -> (Session, FloorSession) {
        locked_session_with(Settings::default())
    }

    fn locked_session_with(settings: Settings) -> (Session, FloorSession) {
        let mut ar = overhead();
        let mut session = Session::new(settings, 7);
        run(&mut session, &mut ar, 1);
        let centre = VIEWPORT * 0.5;
        touch_start(&mut session, &mut ar, centre, 0.0);
        touch_start(&mut session, &mut ar, centre, 10.0);
        touch_end(&mut session, &mut ar, centre, 20.0);
        assert_eq!(session.toggle_lock(), Ok(true));
        run(&mut session, &mut ar, 1);
        session.drain_events().for_each(drop);
        (session, ar)
    }

    /// Throw a ball that flies far over the basket and lands on the floor
    fn throw_miss(session: &mut Session, ar: &mut FloorSession) {
        ar.set_pose(Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY);
        run(session, ar, 1);
        let t = session.now_ms();
        touch_start(session, ar, Vec2::new(180.0, 400.0), t);
        touch_end(session, ar, Vec2::new(180.0, 300.0), t + 200.0);
        run(session, ar, 90);
    }

    #[test]
    fn test_first_touch_only_starts() {
        let mut ar = overhead();
        let mut session = Session::new(Settings::default(), 1);
        assert!(matches!(
            session.drain_events().next(),
            Some(GameEvent::ShowMessage { .. })
        ));

        touch_start(&mut session, &mut ar, VIEWPORT * 0.5, 0.0);
        assert!(session.is_started());
        assert_eq!(session.placement(), Placement::Unplaced);
        assert_eq!(session.drain_events().collect::<Vec<_>>(), vec![GameEvent::HideMessage]);
    }

    #[test]
    fn test_placement_and_replacement() {
        let mut ar = overhead();
        let mut session = Session::new(Settings::default(), 1);
        touch_start(&mut session, &mut ar, VIEWPORT * 0.5, 0.0);
        touch_start(&mut session, &mut ar, VIEWPORT * 0.5, 10.0);

        assert_eq!(session.placement(), Placement::Unlocked);
        let basket = session.basket().unwrap();
        assert!(basket.position.length() < 1e-4);
        assert_eq!(basket.walls.len(), 4);
        // Ground + frame + four walls
        assert_eq!(session.world().len(), 6);
        assert!(messages(&mut session).iter().any(|m| m == PLACED_MESSAGE));
        let node = session.scene().get(session.basket_node()).unwrap();
        assert!(node.visible);

        let old: Vec<_> = session.basket().unwrap().bodies().collect();
        touch_start(&mut session, &mut ar, Vec2::new(200.0, 300.0), 20.0);
        assert_eq!(session.placement(), Placement::Unlocked);
        assert_eq!(session.world().len(), 6);
        for handle in old {
            assert!(!session.world().contains(handle));
        }
        let ground = session.world().body(session.ground).unwrap();
        assert_eq!(ground.position, session.basket().unwrap().position);
    }

    #[test]
    fn test_placement_miss_destroys_basket() {
        let mut ar = overhead();
        let mut session = Session::new(Settings::default(), 1);
        touch_start(&mut session, &mut ar, VIEWPORT * 0.5, 0.0);
        touch_start(&mut session, &mut ar, VIEWPORT * 0.5, 10.0);
        assert!(session.basket().is_some());

        // Look at the horizon and tap the sky
        ar.set_pose(Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY);
        session.drain_events().for_each(drop);
        touch_start(&mut session, &mut ar, Vec2::new(180.0, 50.0), 20.0);

        assert_eq!(session.placement(), Placement::Unplaced);
        assert!(session.basket().is_none());
        assert_eq!(session.world().len(), 1);
        let node = session.scene().get(session.basket_node()).unwrap();
        assert!(!node.visible);
        assert_eq!(node.position, HIDDEN_POSITION);
        assert!(
            messages(&mut session)
                .iter()
                .any(|m| m == "invalid bin location, please try again ಠ▃ಠ")
        );
    }

    #[test]
    fn test_lock_requires_basket() {
        let mut ar = overhead();
        let mut session = Session::new(Settings::default(), 1);
        session.drain_events().for_each(drop);
        session.handle_input(&mut ar, InputEvent::ToggleLock);
        assert_eq!(session.placement(), Placement::Unplaced);
        assert_eq!(messages(&mut session), vec!["where is your basket dude ಠ▃ಠ".to_string()]);
    }

    #[test]
    fn test_lock_arms_one_ball_and_unlock_disarms() {
        let (mut session, mut ar) = locked_session();
        assert_eq!(session.placement(), Placement::Locked);
        assert_eq!(session.balls().count(), 1);
        assert!(session.ready_ball().is_some());
        assert!(!session.scene().get(session.reticle()).unwrap().visible);

        // Touches no longer move the basket
        let before = session.basket().unwrap().position;
        touch_start(&mut session, &mut ar, Vec2::new(10.0, 600.0), 100.0);
        assert_eq!(session.basket().unwrap().position, before);

        assert_eq!(session.toggle_lock(), Ok(false));
        assert_eq!(session.balls().count(), 0);
        assert!(session.scene().get(session.reticle()).unwrap().visible);
    }

    #[test]
    fn test_swipe_throw_velocity() {
        let (mut session, mut ar) = locked_session();
        let camera = *session.camera().unwrap();
        let t = session.now_ms();

        touch_start(&mut session, &mut ar, Vec2::new(180.0, 500.0), t);
        touch_end(&mut session, &mut ar, Vec2::new(180.0, 400.0), t + 200.0);

        let ball = session.balls().next().unwrap();
        let body = session.world().body(ball.body.unwrap()).unwrap();
        let (_, dir) = camera.screen_ray(Vec2::new(0.5, 400.0 / 640.0));
        let expected = dir * 0.5 * 12.0 + Vec3::Y * 0.5 * 0.5;
        assert!((body.velocity - expected).length() < 1e-4);
        assert!((body.position - camera.to_world(READY_BALL_OFFSET)).length() < 1e-5);

        let node = session.scene().get(ball.node).unwrap();
        assert_eq!(node.anchor, Anchor::World);
        assert!(session.ready_ball().is_none());
        assert!(
            session
                .drain_events()
                .any(|e| e == GameEvent::PlaySound(Sound::Throw))
        );

        // Next ball after the respawn delay
        run(&mut session, &mut ar, 30);
        assert!(session.ready_ball().is_none());
        run(&mut session, &mut ar, 35);
        assert!(session.ready_ball().is_some());
    }

    #[test]
    fn test_thrown_ball_uses_configured_material() {
        let settings = Settings {
            ball_restitution: 0.6,
            ball_friction: 0.1,
            ball_damping: 0.2,
            ..Settings::default()
        };
        let (mut session, mut ar) = locked_session_with(settings);
        let t = session.now_ms();
        touch_start(&mut session, &mut ar, Vec2::new(180.0, 500.0), t);
        touch_end(&mut session, &mut ar, Vec2::new(180.0, 400.0), t + 200.0);

        let ball = session.balls().next().unwrap();
        let body = session.world().body(ball.body.unwrap()).unwrap();
        assert_eq!(body.restitution, 0.6);
        assert_eq!(body.friction, 0.1);
        assert_eq!(body.linear_damping, 0.2);
    }

    #[test]
    fn test_replacement_clears_balls_in_flight() {
        let (mut session, mut ar) = locked_session();
        let t = session.now_ms();
        touch_start(&mut session, &mut ar, Vec2::new(180.0, 500.0), t);
        touch_end(&mut session, &mut ar, Vec2::new(180.0, 400.0), t + 200.0);
        let thrown = session.balls().next().unwrap().clone();
        // Ground + frame + four walls + the thrown ball
        assert_eq!(session.world().len(), 7);

        assert_eq!(session.toggle_lock(), Ok(false));
        assert_eq!(session.balls().count(), 1);

        session.place_basket(&mut ar, Vec2::splat(0.5)).unwrap();
        assert_eq!(session.world().len(), 6);
        assert_eq!(session.balls().count(), 0);
        assert!(!session.world().contains(thrown.body.unwrap()));
        assert!(session.scene().get(thrown.node).is_none());
    }

    #[test]
    fn test_unlock_clears_taunt() {
        let (mut session, mut ar) = locked_session();
        for _ in 0..3 {
            throw_miss(&mut session, &mut ar);
        }
        assert!(session.score().paused);
        assert_eq!(session.score().taunt_stage, 1);
        session.drain_events().for_each(drop);

        assert_eq!(session.toggle_lock(), Ok(false));
        assert!(!session.score().paused);
        assert_eq!(session.score().taunt_stage, 0);
        // The streak itself survives an unlock
        assert_eq!(session.score().consecutive_misses, 3);
        let events: Vec<_> = session.drain_events().collect();
        assert!(events.contains(&GameEvent::TauntEnded));
        assert!(events.contains(&GameEvent::LockChanged(false)));

        // Relocking allows throws again
        assert_eq!(session.toggle_lock(), Ok(true));
        assert!(session.ready_ball().is_some());
    }

    #[test]
    fn test_throw_preconditions() {
        let (mut session, mut ar) = locked_session();
        let swipe = SwipeGesture {
            start: Vec2::ZERO,
            start_time: 10.0,
            end: Vec2::new(0.0, 50.0),
            end_time: 10.0,
        };
        assert_eq!(
            session.throw_ball(&swipe, Vec2::splat(0.5)),
            Err(GameError::InvalidSwipe)
        );

        // Touch-end with no touch-start
        touch_end(&mut session, &mut ar, Vec2::ZERO, 5.0);
        assert!(session.ready_ball().is_some());

        let good = SwipeGesture {
            end_time: 110.0,
            ..swipe
        };
        assert!(session.throw_ball(&good, Vec2::splat(0.5)).is_ok());
        assert_eq!(
            session.throw_ball(&good, Vec2::splat(0.5)),
            Err(GameError::NoReadyBall)
        );

        session.toggle_lock().unwrap();
        assert_eq!(
            session.throw_ball(&good, Vec2::splat(0.5)),
            Err(GameError::BasketUnlocked)
        );
    }

    #[test]
    fn test_drop_into_basket_scores() {
        let (mut session, mut ar) = locked_session();
        let t = session.now_ms();
        // Barely a swipe: the ball drops straight down into the basket
        touch_start(&mut session, &mut ar, Vec2::new(180.0, 320.0), t);
        touch_end(&mut session, &mut ar, Vec2::new(180.0, 321.0), t + 1000.0);
        run(&mut session, &mut ar, 40);

        assert_eq!(session.score().total, 1);
        assert_eq!(session.score().consecutive_misses, 0);
        let events: Vec<_> = session.drain_events().collect();
        assert!(events.contains(&GameEvent::ScoreChanged { total: 1, points: 1 }));
        assert!(events.iter().any(
            |e| matches!(e, GameEvent::PlaySound(Sound::Cheer(c)) if *c < CHEER_VARIANTS)
        ));
        assert!(!events.iter().any(|e| matches!(e, GameEvent::Missed { .. })));

        // Retired after lingering; the respawned ball is the only one left
        run(&mut session, &mut ar, 120);
        assert_eq!(session.balls().count(), 1);
        assert!(session.ready_ball().is_some());
        // The retired ball's slot is emptied, not reused
        assert!(session.balls[0].is_none());
        assert_eq!(session.balls.len(), 2);
    }

    #[test]
    fn test_miss_and_taunt_stages() {
        let (mut session, mut ar) = locked_session();

        for _ in 0..2 {
            throw_miss(&mut session, &mut ar);
        }
        assert_eq!(session.score().consecutive_misses, 2);
        assert!(!session.score().paused);

        throw_miss(&mut session, &mut ar);
        let events: Vec<_> = session.drain_events().collect();
        assert!(events.contains(&GameEvent::TauntStarted(1)));
        assert!(events.contains(&GameEvent::PlaySound(Sound::Taunt { stage: 1 })));
        assert!(session.score().paused);

        // Paused: throwing does nothing until the tune ends
        throw_miss(&mut session, &mut ar);
        assert_eq!(session.score().consecutive_misses, 3);
        session.handle_input(&mut ar, InputEvent::SoundFinished(Sound::Taunt { stage: 1 }));
        assert!(!session.score().paused);
        assert!(session.drain_events().any(|e| e == GameEvent::TauntEnded));

        for _ in 0..3 {
            throw_miss(&mut session, &mut ar);
        }
        assert_eq!(session.score().consecutive_misses, 6);
        assert!(session.drain_events().any(|e| e == GameEvent::TauntStarted(2)));
        assert_eq!(session.score().total, 0);
    }

    #[test]
    fn test_stale_message_timer_ignored() {
        let mut ar = overhead();
        let mut session = Session::new(Settings::default(), 1);
        touch_start(&mut session, &mut ar, VIEWPORT * 0.5, 0.0);
        touch_start(&mut session, &mut ar, VIEWPORT * 0.5, 0.0);
        // Second message 3s after the first
        run(&mut session, &mut ar, 180);
        session.handle_input(&mut ar, InputEvent::ToggleLock);
        session.handle_input(&mut ar, InputEvent::ToggleLock);
        session.place_basket(&mut ar, Vec2::splat(0.5)).unwrap();
        session.drain_events().for_each(drop);

        // First message's timer fires at 5s and is ignored
        run(&mut session, &mut ar, 150);
        assert!(!session.drain_events().any(|e| e == GameEvent::HideMessage));
        // Second message hides at 8s
        run(&mut session, &mut ar, 190);
        assert!(session.drain_events().any(|e| e == GameEvent::HideMessage));
    }

    #[test]
    fn test_reticle_tracks_centre_hit() {
        let mut ar = overhead();
        let mut session = Session::new(Settings::default(), 1);
        run(&mut session, &mut ar, 1);
        let node = session.scene().get(session.reticle()).unwrap();
        assert!(node.position.length() < 1e-4);

        ar.set_pose(Vec3::new(1.0, 1.0, 0.0), Quat::from_rotation_x(-FRAC_PI_2));
        run(&mut session, &mut ar, 1);
        let node = session.scene().get(session.reticle()).unwrap();
        assert!((node.position.x - 0.25).abs() < 1e-3);
        run(&mut session, &mut ar, 60);
        let node = session.scene().get(session.reticle()).unwrap();
        assert!((node.position.x - 1.0).abs() < 1e-3);
    }
}
