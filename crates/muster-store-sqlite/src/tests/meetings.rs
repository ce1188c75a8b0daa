//! Meeting creation, listing, scoping and deletion through `registry`.

use std::{collections::HashSet, sync::Arc};

use muster_core::{
  Error,
  attendee::NewAttendee,
  ledger,
  meeting::{LeaderSnapshot, MeetingFilter},
};

use super::*;

// ─── Creation ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_assigns_code_and_snapshot() {
  let s = store().await;
  let leader = identity(&s, &[Role::Leader], Some("1017")).await;

  let m = meeting(&s, &leader, "Kickoff", at(1, 18)).await;
  assert_eq!(m.code.len(), 6);
  assert!(m.code.chars().all(|c| c.is_ascii_digit()));
  assert_eq!(m.leader_id, leader.identity_id);
  assert_eq!(m.leader, LeaderSnapshot::of(&leader));

  let found = registry::find_by_code(&s, &m.code).await.unwrap();
  assert_eq!(found.meeting_id, m.meeting_id);
}

#[tokio::test]
async fn supplied_snapshot_overrides_stored_fields() {
  let s = store().await;
  let leader = identity(&s, &[Role::Leader], Some("1017")).await;
  let input = NewMeeting {
    details: details("Custom", at(2, 9)),
    leader:  Some(LeaderSnapshot {
      name:     "Display Override".into(),
      document: None,
      phone:    Some("3110000000".into()),
    }),
  };

  let m = registry::create_meeting(&s, &RandomCodes::default(), &caller(&leader), leader.identity_id, input)
    .await
    .unwrap();
  assert_eq!(m.leader.name, "Display Override");
  assert_eq!(m.leader.document.as_deref(), Some("1017"));
  assert_eq!(m.leader.phone.as_deref(), Some("3110000000"));
}

#[tokio::test]
async fn leader_without_document_cannot_create() {
  let s = store().await;
  let leader = identity(&s, &[Role::Leader], None).await;

  let err = registry::create_meeting(
    &s,
    &RandomCodes::default(),
    &caller(&leader),
    leader.identity_id,
    new_meeting("Nope", at(1, 9)),
  )
  .await
  .unwrap_err();
  assert!(matches!(err, Error::PreconditionFailed(_)));
  assert!(s.list_meetings(&MeetingFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn admin_may_create_for_leader_without_document() {
  let s = store().await;
  let admin = identity(&s, &[Role::Admin], Some("1")).await;
  let leader = identity(&s, &[Role::Leader], None).await;

  let m = registry::create_meeting(
    &s,
    &RandomCodes::default(),
    &caller(&admin),
    leader.identity_id,
    new_meeting("On behalf", at(1, 9)),
  )
  .await
  .unwrap();
  assert_eq!(m.leader_id, leader.identity_id);
}

#[tokio::test]
async fn create_rejects_invalid_details() {
  let s = store().await;
  let leader = identity(&s, &[Role::Leader], Some("1")).await;

  let err = registry::create_meeting(
    &s,
    &RandomCodes::default(),
    &caller(&leader),
    leader.identity_id,
    new_meeting("   ", at(1, 9)),
  )
  .await
  .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn create_for_unknown_owner_is_not_found() {
  let s = store().await;
  let admin = identity(&s, &[Role::Admin], Some("1")).await;

  let err = registry::create_meeting(
    &s,
    &RandomCodes::default(),
    &caller(&admin),
    Uuid::new_v4(),
    new_meeting("Ghost", at(1, 9)),
  )
  .await
  .unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn acting_for_others_follows_scope() {
  let s = store().await;
  let coordinator = identity(&s, &[Role::Coordinator], Some("1")).await;
  let managed = managed_leader(&s, coordinator.identity_id, "2").await;
  let stranger = identity(&s, &[Role::Leader], Some("3")).await;
  let codes = RandomCodes::default();

  registry::create_meeting(&s, &codes, &caller(&coordinator), managed.identity_id, new_meeting("Ok", at(1, 9)))
    .await
    .unwrap();

  let err = registry::create_meeting(
    &s,
    &codes,
    &caller(&coordinator),
    stranger.identity_id,
    new_meeting("Out of scope", at(1, 9)),
  )
  .await
  .unwrap_err();
  assert!(matches!(err, Error::Forbidden(_)));

  let err = registry::create_meeting(
    &s,
    &codes,
    &caller(&managed),
    stranger.identity_id,
    new_meeting("Peer", at(1, 9)),
  )
  .await
  .unwrap_err();
  assert!(matches!(err, Error::Forbidden(_)));
}

#[tokio::test]
async fn taken_code_is_skipped() {
  let s = store().await;
  let leader = identity(&s, &[Role::Leader], Some("1")).await;
  let codes = ScriptedCodes::new(&["111111", "111111", "222222"]);

  let first = registry::create_meeting(&s, &codes, &caller(&leader), leader.identity_id, new_meeting("A", at(1, 9)))
    .await
    .unwrap();
  let second = registry::create_meeting(&s, &codes, &caller(&leader), leader.identity_id, new_meeting("B", at(1, 9)))
    .await
    .unwrap();

  assert_eq!(first.code, "111111");
  assert_eq!(second.code, "222222");
}

#[tokio::test]
async fn lost_insert_race_draws_another_code() {
  let s = RiggedStore::blind(store().await);
  let leader = s.put_identity(new_identity(&[Role::Leader], Some("1"))).await.unwrap();
  let codes = ScriptedCodes::new(&["555555", "555555", "666666"]);

  let first = registry::create_meeting(&s, &codes, &caller(&leader), leader.identity_id, new_meeting("A", at(1, 9)))
    .await
    .unwrap();
  let second = registry::create_meeting(&s, &codes, &caller(&leader), leader.identity_id, new_meeting("B", at(1, 9)))
    .await
    .unwrap();

  assert_eq!(first.code, "555555");
  assert_eq!(second.code, "666666");
  assert_eq!(s.list_meetings(&MeetingFilter::default()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn exhausted_code_attempts_conflict() {
  let s = RiggedStore::blind(store().await);
  let leader = s.put_identity(new_identity(&[Role::Leader], Some("1"))).await.unwrap();
  let taken = vec!["777777"; registry::MAX_CODE_ATTEMPTS + 1];
  let codes = ScriptedCodes::new(&taken);

  registry::create_meeting(&s, &codes, &caller(&leader), leader.identity_id, new_meeting("A", at(1, 9)))
    .await
    .unwrap();
  let err = registry::create_meeting(&s, &codes, &caller(&leader), leader.identity_id, new_meeting("B", at(1, 9)))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creations_never_share_a_code() {
  let s = Arc::new(store().await);
  let leader = identity(&s, &[Role::Leader], Some("1")).await;
  // Four digits keeps collisions likely across 200 meetings.
  let codes = Arc::new(RandomCodes::new(4).unwrap());

  let mut tasks = Vec::new();
  for i in 0..200 {
    let (s, codes, leader) = (s.clone(), codes.clone(), leader.clone());
    tasks.push(tokio::spawn(async move {
      registry::create_meeting(
        &*s,
        &*codes,
        &caller(&leader),
        leader.identity_id,
        new_meeting(&format!("Meeting {i}"), at(1, 9)),
      )
      .await
    }));
  }

  let mut seen = HashSet::new();
  for task in tasks {
    let m = task.await.unwrap().unwrap();
    assert!(seen.insert(m.code), "code handed out twice");
  }
  let stored = s.list_meetings(&MeetingFilter::default()).await.unwrap();
  assert_eq!(stored.len(), 200);
  assert_eq!(stored.iter().map(|m| &m.code).collect::<HashSet<_>>().len(), 200);
}

#[tokio::test]
async fn unknown_code_is_not_found() {
  let s = store().await;
  let err = registry::find_by_code(&s, "000000").await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

// ─── Listing and scope ───────────────────────────────────────────────────────

#[tokio::test]
async fn list_is_latest_first() {
  let s = store().await;
  let leader = identity(&s, &[Role::Leader], Some("1")).await;
  meeting(&s, &leader, "Early", at(1, 9)).await;
  meeting(&s, &leader, "Late", at(9, 9)).await;
  meeting(&s, &leader, "Middle", at(5, 9)).await;

  let names: Vec<String> = registry::list(&s, &caller(&leader), MeetingFilter::default(), None)
    .await
    .unwrap()
    .into_iter()
    .map(|m| m.details.name)
    .collect();
  assert_eq!(names, ["Late", "Middle", "Early"]);
}

#[tokio::test]
async fn coordinator_sees_self_and_managed_leaders_only() {
  let s = store().await;
  let admin = identity(&s, &[Role::Admin], Some("0")).await;
  let coordinator = identity(&s, &[Role::Coordinator], Some("1")).await;
  let l1 = managed_leader(&s, coordinator.identity_id, "2").await;
  let l2 = managed_leader(&s, coordinator.identity_id, "3").await;
  let l3 = identity(&s, &[Role::Leader], Some("4")).await;

  let own = meeting(&s, &coordinator, "Coordinator's", at(1, 9)).await;
  let m1 = meeting(&s, &l1, "L1", at(2, 9)).await;
  let m2 = meeting(&s, &l2, "L2", at(3, 9)).await;
  let m3 = meeting(&s, &l3, "L3", at(4, 9)).await;

  let visible: HashSet<Uuid> = registry::list(&s, &caller(&coordinator), MeetingFilter::default(), None)
    .await
    .unwrap()
    .into_iter()
    .map(|m| m.meeting_id)
    .collect();
  assert_eq!(visible, HashSet::from([own.meeting_id, m1.meeting_id, m2.meeting_id]));

  let all = registry::list(&s, &caller(&admin), MeetingFilter::default(), None).await.unwrap();
  assert_eq!(all.len(), 4);

  let only_l3 = registry::list(&s, &caller(&admin), MeetingFilter::default(), Some(l3.identity_id))
    .await
    .unwrap();
  assert_eq!(only_l3.len(), 1);
  assert_eq!(only_l3[0].meeting_id, m3.meeting_id);

  let err = registry::list(&s, &caller(&coordinator), MeetingFilter::default(), Some(l3.identity_id))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Forbidden(_)));

  let mine = registry::list(&s, &caller(&l1), MeetingFilter::default(), None).await.unwrap();
  assert_eq!(mine.len(), 1);
  assert_eq!(mine[0].meeting_id, m1.meeting_id);
}

#[tokio::test]
async fn viewer_role_sees_everything() {
  let s = store().await;
  let viewer = identity(&s, &[Role::Leader, Role::CanViewAllAttendees], Some("0")).await;
  let a = identity(&s, &[Role::Leader], Some("1")).await;
  let b = identity(&s, &[Role::Leader], Some("2")).await;
  meeting(&s, &a, "A", at(1, 9)).await;
  meeting(&s, &b, "B", at(1, 9)).await;

  let all = registry::list(&s, &caller(&viewer), MeetingFilter::default(), None).await.unwrap();
  assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn list_filters_by_date_and_location() {
  let s = store().await;
  let admin = identity(&s, &[Role::Admin], Some("0")).await;
  let leader = identity(&s, &[Role::Leader], Some("1")).await;
  let before = meeting(&s, &leader, "Before", at(1, 23)).await;
  let inside = meeting(&s, &leader, "Inside", at(10, 23)).await;
  let after = meeting(&s, &leader, "After", at(11, 0)).await;

  let mut bogota = new_meeting("Bogota", at(5, 12));
  bogota.details.region = Some("Cundinamarca".into());
  bogota.details.locality = Some("Bogota".into());
  bogota.details.district = None;
  bogota.details.neighborhood = Some("Chapinero".into());
  let bogota = registry::create_meeting(&s, &RandomCodes::default(), &caller(&leader), leader.identity_id, bogota)
    .await
    .unwrap();

  let ids = |ms: Vec<Meeting>| ms.into_iter().map(|m| m.meeting_id).collect::<HashSet<_>>();

  let window = MeetingFilter {
    date_start: Some(at(2, 0).date_naive()),
    date_end: Some(at(10, 0).date_naive()),
    ..Default::default()
  };
  let found = ids(registry::list(&s, &caller(&admin), window, None).await.unwrap());
  assert_eq!(found, HashSet::from([inside.meeting_id, bogota.meeting_id]));
  assert!(!found.contains(&before.meeting_id));
  assert!(!found.contains(&after.meeting_id));

  let chapinero = MeetingFilter { location: Some("chapi".into()), ..Default::default() };
  let found = ids(registry::list(&s, &caller(&admin), chapinero, None).await.unwrap());
  assert_eq!(found, HashSet::from([bogota.meeting_id]));

  let region = MeetingFilter { region: Some("Antioquia".into()), ..Default::default() };
  assert_eq!(registry::list(&s, &caller(&admin), region, None).await.unwrap().len(), 3);

  let one = MeetingFilter { meeting_id: Some(after.meeting_id), ..Default::default() };
  let found = registry::list(&s, &caller(&admin), one, None).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].details.name, "After");
}

// ─── Updates and deletion ────────────────────────────────────────────────────

#[tokio::test]
async fn update_details_keeps_code_and_owner() {
  let s = store().await;
  let leader = identity(&s, &[Role::Leader], Some("1")).await;
  let other = identity(&s, &[Role::Leader], Some("2")).await;
  let m = meeting(&s, &leader, "Draft", at(1, 9)).await;

  let updated = registry::update_details(&s, &caller(&leader), m.meeting_id, details("Final", at(2, 10)))
    .await
    .unwrap();
  assert_eq!(updated.code, m.code);
  assert_eq!(updated.leader_id, leader.identity_id);

  let stored = s.get_meeting(m.meeting_id).await.unwrap().unwrap();
  assert_eq!(stored.details.name, "Final");
  assert_eq!(stored.details.scheduled_at, at(2, 10));

  let err = registry::update_details(&s, &caller(&other), m.meeting_id, details("Hijack", at(2, 10)))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn leaders_cannot_delete_meetings() {
  let s = store().await;
  let leader = identity(&s, &[Role::Leader], Some("1")).await;
  let m = meeting(&s, &leader, "Mine", at(1, 9)).await;

  let err = registry::delete_one(&s, &caller(&leader), m.meeting_id).await.unwrap_err();
  assert!(matches!(err, Error::Forbidden(_)));
  assert!(s.get_meeting(m.meeting_id).await.unwrap().is_some());
}

#[tokio::test]
async fn coordinator_deletes_inside_scope_only() {
  let s = store().await;
  let coordinator = identity(&s, &[Role::Coordinator], Some("1")).await;
  let managed = managed_leader(&s, coordinator.identity_id, "2").await;
  let stranger = identity(&s, &[Role::Leader], Some("3")).await;
  let inside = meeting(&s, &managed, "Inside", at(1, 9)).await;
  let outside = meeting(&s, &stranger, "Outside", at(1, 9)).await;

  let deleted = registry::delete_many(&s, &caller(&coordinator), vec![inside.meeting_id, outside.meeting_id])
    .await
    .unwrap();
  assert_eq!(deleted, 1);
  assert!(s.get_meeting(outside.meeting_id).await.unwrap().is_some());

  let err = registry::delete_one(&s, &caller(&coordinator), outside.meeting_id).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn admin_delete_removes_attendees() {
  let s = store().await;
  let admin = identity(&s, &[Role::Admin], Some("0")).await;
  let leader = identity(&s, &[Role::Leader], Some("1")).await;
  let m = meeting(&s, &leader, "Doomed", at(1, 9)).await;
  let signed: NewAttendee = attendee("12345");
  ledger::register(&s, &m.code, signed).await.unwrap();

  registry::delete_one(&s, &caller(&admin), m.meeting_id).await.unwrap();
  assert!(s.list_attendees(m.meeting_id).await.unwrap().is_empty());
  let err = registry::find_by_code(&s, &m.code).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn viewing_everything_grants_no_extra_writes() {
  let s = store().await;
  let coordinator = identity(&s, &[Role::Coordinator, Role::CanViewAllAttendees], Some("1")).await;
  let managed = managed_leader(&s, coordinator.identity_id, "2").await;
  let stranger = identity(&s, &[Role::Leader], Some("3")).await;
  let theirs = meeting(&s, &stranger, "Stranger's", at(1, 9)).await;
  let ours = meeting(&s, &managed, "Managed", at(2, 9)).await;
  let as_coordinator = caller(&coordinator);

  let all = registry::list(&s, &as_coordinator, MeetingFilter::default(), None).await.unwrap();
  assert_eq!(all.len(), 2);

  let err = registry::create_meeting(
    &s,
    &RandomCodes::default(),
    &as_coordinator,
    stranger.identity_id,
    new_meeting("Not mine", at(3, 9)),
  )
  .await
  .unwrap_err();
  assert!(matches!(err, Error::Forbidden(_)));

  let err = registry::update_details(&s, &as_coordinator, theirs.meeting_id, details("Renamed", at(1, 9)))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Forbidden(_)));

  let entry = muster_core::voter::VoterDetails {
    name: "Pedro".into(),
    surname: "Gomez".into(),
    document: "100200300".into(),
    ..Default::default()
  };
  let err = muster_core::roster::create_voter(&s, &as_coordinator, stranger.identity_id, entry)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Forbidden(_)));

  let deleted = registry::delete_many(&s, &as_coordinator, vec![theirs.meeting_id, ours.meeting_id])
    .await
    .unwrap();
  assert_eq!(deleted, 1);
  assert!(s.get_meeting(theirs.meeting_id).await.unwrap().is_some());
  assert!(s.get_meeting(ours.meeting_id).await.unwrap().is_none());

  registry::create_meeting(
    &s,
    &RandomCodes::default(),
    &as_coordinator,
    managed.identity_id,
    new_meeting("On behalf", at(3, 9)),
  )
  .await
  .unwrap();
}
