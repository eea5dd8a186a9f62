use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use behavior_tree::builder::{
    action, condition, parallel, repeat_forever, repeater, selector, wait,
};
use behavior_tree::{
    BehaviorTreeContext, BehaviorTreeDebugger, BehaviorTreeInstance, BehaviorTreeRunner,
    Blackboard, BlackboardKey, CancellationSignal, Cooldown, HeartbeatService, Inverter,
    NodeState, ParallelPolicy, RunnerConfig, Timeout, TreeNode,
};

const ALERT: BlackboardKey = BlackboardKey::new(1);
const HEARTBEATS: BlackboardKey = BlackboardKey::new(2);

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Enter(String),
    Exit(String, NodeState),
    Aborted(String),
    Completed(NodeState),
    Restarted,
}

#[derive(Default)]
struct RecordingDebugger {
    events: Mutex<Vec<Event>>,
}

impl RecordingDebugger {
    fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl BehaviorTreeDebugger for RecordingDebugger {
    fn on_node_enter(&self, node: &TreeNode, _ctx: &BehaviorTreeContext) {
        self.push(Event::Enter(node.name().to_owned()));
    }

    fn on_node_exit(&self, node: &TreeNode, _ctx: &BehaviorTreeContext, result: NodeState, _d: f32) {
        self.push(Event::Exit(node.name().to_owned(), result));
    }

    fn on_node_aborted(&self, node: &TreeNode, _ctx: &BehaviorTreeContext) {
        self.push(Event::Aborted(node.name().to_owned()));
    }

    fn on_tree_completed(&self, _instance: &BehaviorTreeInstance, result: NodeState) {
        self.push(Event::Completed(result));
    }

    fn on_tree_restarted(&self, _instance: &BehaviorTreeInstance) {
        self.push(Event::Restarted);
    }
}

fn context_with(debugger: &Arc<RecordingDebugger>) -> BehaviorTreeContext {
    BehaviorTreeContext::builder()
        .with_debugger(debugger.clone())
        .with_seed(1)
        .build()
}

fn running() -> TreeNode {
    action(|_, _| Ok(NodeState::Running)).with_name("Patrol")
}

#[test]
fn double_abort_completes_tree_once() {
    let debugger = Arc::new(RecordingDebugger::default());
    let root = selector(vec![running()]);
    let mut instance = BehaviorTreeInstance::new(root, context_with(&debugger));

    assert_eq!(instance.tick(0.1).unwrap(), NodeState::Running);
    debugger.take();

    instance.abort();
    instance.abort();

    let events = debugger.take();
    let completions: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, Event::Completed(_)))
        .collect();
    assert_eq!(completions, [&Event::Completed(NodeState::Failure)]);
    // Children are aborted before their parent.
    assert_eq!(
        events,
        [
            Event::Exit("Patrol".into(), NodeState::Failure),
            Event::Aborted("Patrol".into()),
            Event::Exit("Selector".into(), NodeState::Failure),
            Event::Aborted("Selector".into()),
            Event::Completed(NodeState::Failure),
        ]
    );
}

#[test]
fn natural_completion_reports_enter_exit_and_completion() {
    let debugger = Arc::new(RecordingDebugger::default());
    let root = selector(vec![condition(|_| false), condition(|_| true)]);
    let mut instance = BehaviorTreeInstance::new(root, context_with(&debugger));

    assert_eq!(instance.tick(0.1).unwrap(), NodeState::Success);
    assert_eq!(
        debugger.take(),
        [
            Event::Enter("Selector".into()),
            Event::Enter("Condition".into()),
            Event::Exit("Condition".into(), NodeState::Failure),
            Event::Enter("Condition".into()),
            Event::Exit("Condition".into(), NodeState::Success),
            Event::Exit("Selector".into(), NodeState::Success),
            Event::Completed(NodeState::Success),
        ]
    );

    instance.restart();
    assert_eq!(debugger.take(), [Event::Restarted]);
    assert_eq!(instance.tick(0.1).unwrap(), NodeState::Success);
}

#[test]
fn timeout_breaks_a_stuck_branch_and_selector_falls_back() {
    let fallback_runs = Arc::new(AtomicUsize::new(0));
    let runs = Arc::clone(&fallback_runs);

    let stuck = running().with_decorator(Arc::new(Timeout::new(0.5).unwrap()));
    let fallback = action(move |_, _| {
        runs.fetch_add(1, Ordering::SeqCst);
        Ok(NodeState::Success)
    });
    let mut instance =
        BehaviorTreeInstance::new(selector(vec![stuck, fallback]), Default::default());

    assert_eq!(instance.tick(0.2).unwrap(), NodeState::Running);
    assert_eq!(instance.tick(0.2).unwrap(), NodeState::Running);
    assert_eq!(fallback_runs.load(Ordering::SeqCst), 0);
    // 0.6s of running time crosses the 0.5s limit.
    assert_eq!(instance.tick(0.2).unwrap(), NodeState::Success);
    assert_eq!(fallback_runs.load(Ordering::SeqCst), 1);
}

#[test]
fn timed_out_branch_restarts_fresh_under_repeater() {
    let inits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&inits);
    let stuck = behavior_tree::ActionNode::new(|_, _| Ok(NodeState::Running)).with_initialize(
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    );
    let guarded = selector(vec![TreeNode::new("Stuck", stuck)])
        .with_decorator(Arc::new(Timeout::new(0.5).unwrap()));
    let mut instance =
        BehaviorTreeInstance::new(repeat_forever(true, guarded), Default::default());

    // Each 0.6s window times out once and the next activation starts over.
    for _ in 0..4 {
        assert_eq!(instance.tick(0.3).unwrap(), NodeState::Running);
    }
    assert_eq!(inits.load(Ordering::SeqCst), 2);

    instance.abort();
    let selector = &instance.root().children()[0];
    assert!(!selector.is_active());
    assert!(!selector.children()[0].is_active());
}

#[test]
fn shared_cooldown_tracks_nodes_independently() {
    let cooldown = Arc::new(Cooldown::new(1.0).unwrap());
    let mut attack = condition(|_| true).with_decorator(cooldown.clone());
    let mut taunt = condition(|_| true).with_decorator(cooldown.clone());
    let (attack_id, taunt_id) = (attack.id(), taunt.id());
    let mut ctx = BehaviorTreeContext::default();

    ctx.begin_tick(0.5);
    assert_eq!(attack.execute(&mut ctx, 0.5).unwrap(), NodeState::Success);
    assert_eq!(cooldown.next_available(attack_id), Some(1.5));
    assert_eq!(cooldown.next_available(taunt_id), None);

    ctx.begin_tick(0.5);
    assert_eq!(attack.execute(&mut ctx, 0.5).unwrap(), NodeState::Failure);
    assert_eq!(taunt.execute(&mut ctx, 0.5).unwrap(), NodeState::Success);

    ctx.begin_tick(0.5);
    assert_eq!(attack.execute(&mut ctx, 0.5).unwrap(), NodeState::Success);
}

#[test]
fn inverted_condition_in_tree() {
    let root = condition(|_| false).with_decorator(Arc::new(Inverter));
    let mut instance = BehaviorTreeInstance::new(root, Default::default());
    assert_eq!(instance.tick(0.1).unwrap(), NodeState::Success);
}

#[test]
fn parallel_monitor_reruns_finished_children() {
    let checks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&checks);
    let monitor = condition(move |ctx| {
        counter.fetch_add(1, Ordering::SeqCst);
        !ctx.instance_blackboard().get_or(ALERT, false)
    });
    let root = parallel(
        ParallelPolicy::All,
        ParallelPolicy::Any,
        vec![monitor, wait(1.0, 0.0).unwrap()],
    );
    let mut instance = BehaviorTreeInstance::new(root, Default::default());

    assert_eq!(instance.tick(0.25).unwrap(), NodeState::Running);
    assert_eq!(instance.tick(0.25).unwrap(), NodeState::Running);
    instance
        .context()
        .instance_blackboard()
        .set(ALERT, true)
        .unwrap();
    assert_eq!(instance.tick(0.25).unwrap(), NodeState::Failure);

    assert_eq!(checks.load(Ordering::SeqCst), 3);
    assert!(!instance.root().children()[1].is_active());
}

#[test]
fn heartbeat_writes_blackboard_while_branch_runs() {
    let heartbeat = HeartbeatService::new(0.5, |_, ctx| {
        let beats = ctx.tree_blackboard().get_or(HEARTBEATS, 0_u32);
        ctx.tree_blackboard().set(HEARTBEATS, beats + 1).unwrap();
    });
    let root = wait(2.0, 0.0).unwrap().with_service(Arc::new(heartbeat));
    let tree_board = Blackboard::new();
    let ctx = BehaviorTreeContext::builder()
        .with_tree_blackboard(tree_board.clone())
        .build();
    let mut instance = BehaviorTreeInstance::new(root, ctx);

    let mut ticks = 0;
    while instance.tick(0.25).unwrap().is_running() {
        ticks += 1;
    }
    assert_eq!(ticks, 7);
    assert_eq!(tree_board.get::<u32>(HEARTBEATS).unwrap(), 4);
}

#[test]
fn repeater_reinitializes_child_each_iteration() {
    let inits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&inits);
    let step = behavior_tree::ActionNode::new(|_, _| Ok(NodeState::Success)).with_initialize(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let root = repeater(3, false, TreeNode::new("Step", step)).unwrap();
    let mut instance = BehaviorTreeInstance::new(root, Default::default());

    let mut result = NodeState::Running;
    while result.is_running() {
        result = instance.tick(0.1).unwrap();
    }
    assert_eq!(result, NodeState::Success);
    assert_eq!(inits.load(Ordering::SeqCst), 3);
}

#[test]
fn cancellation_is_observed_by_leaves_and_abort_is_explicit() {
    let signal = CancellationSignal::new();
    let root = action(|ctx, _| {
        Ok(if ctx.is_cancelled() {
            NodeState::Failure
        } else {
            NodeState::Running
        })
    });
    let ctx = BehaviorTreeContext::builder()
        .with_cancellation(signal.clone())
        .build();
    let mut instance = BehaviorTreeInstance::new(root, ctx);

    assert_eq!(instance.tick(0.1).unwrap(), NodeState::Running);
    signal.cancel();
    // The engine does not stop on its own; the leaf decides.
    assert!(instance.is_active());
    assert_eq!(instance.tick(0.1).unwrap(), NodeState::Failure);
    assert!(!instance.is_active());
}

#[test]
fn callback_error_escapes_tick_and_abort_cleans_up() {
    let mut failing = selector(vec![action(|ctx, _| {
        let hp: i32 = ctx.instance_blackboard().get(ALERT)?;
        Ok(NodeState::from(hp > 0))
    })]);
    let mut ctx = BehaviorTreeContext::default();
    assert!(failing.execute(&mut ctx, 0.1).is_err());
    assert!(failing.is_active());
    assert!(failing.children()[0].is_active());

    failing.abort(&mut ctx);
    assert!(!failing.is_active());
    assert!(!failing.children()[0].is_active());
}

#[test]
fn runner_restarts_completed_tree() {
    let completions = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&completions);
    let root = TreeNode::new(
        "Blink",
        behavior_tree::ActionNode::new(|_, _| Ok(NodeState::Success)).with_terminate(
            move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        ),
    );
    let mut runner = BehaviorTreeRunner::new(RunnerConfig {
        auto_start: true,
        restart_on_complete: true,
    });
    runner.set_root(root);

    for _ in 0..4 {
        assert_eq!(runner.update(0.1).unwrap(), Some(NodeState::Success));
    }
    assert_eq!(completions.load(Ordering::SeqCst), 4);

    runner.stop();
    assert_eq!(runner.update(0.1).unwrap(), None);
}
