//! Drop a bouncy ball and a tilted crate onto the ground and print their
//! heights at 60 frames per second.
//!
//! Run with `RUST_LOG=debug` to see contact and resolver activity.

use rigor::{
    ConservationMonitor, ConservationState, Particle, Primitive, Quat, Rigidbody, Shape, Vec3, World,
    WorldConfig,
};

fn main() {
    env_logger::init();

    let mut world = World::from_config(WorldConfig::bouncy());

    let ball = world.add_body(Particle::new(Vec3::new(0.0, 5.0, 0.0), 1.0).with_radius(0.5));
    world.add_gravity(ball);
    world.add_collider(Primitive::Sphere { body: ball, radius: 0.5 });

    let half_extents = Vec3::new(0.5, 0.25, 0.5);
    let crate_box = world.add_body(
        Rigidbody::new(Vec3::new(3.0, 4.0, 0.0), 2.0, Shape::Cuboid { half_extents })
            .with_orientation(Quat::from_axis_angle(&Vec3::z(), 0.3)),
    );
    world.add_gravity(crate_box);
    world.add_collider(Primitive::Cuboid {
        body: crate_box,
        half_extents,
    });

    world.add_primitive(Primitive::ground(0.0));

    let baseline = ConservationState::new(world.bodies(), world.forces());
    let frame_time = 1.0 / 60.0;

    println!("{:>6} {:>10} {:>10}", "t", "ball y", "crate y");
    for frame in 0..240 {
        let state = world.advance(frame_time, true, true);
        if frame % 15 == 0 {
            println!(
                "{:>6.2} {:>10.4} {:>10.4}",
                world.time(),
                state.particles[0].y,
                state.rigidbodies[0].position.y
            );
        }
    }

    let monitor = ConservationMonitor::check(&baseline, world.bodies(), world.forces());
    println!("\nenergy lost to contacts and damping: {:.1}%", monitor.energy_error * 100.0);
}
