//! Swap request state machine.
//!
//! Pure functions: given a snapshot, a command, the acting account and the
//! current time, compute the next snapshot and the effects the store must
//! apply with it. Nothing here touches storage.

use chrono::Utc;
use roster_core::{
    Agent, AgentResponse, AuditAction, AuditEntry, EntityType, RosterError, RosterResult,
    ShiftExchange, ShiftRecord, SupervisorDecision, SwapCommand, SwapDraft, SwapEffect,
    SwapPolicy, SwapRequest, SwapStatus, Timestamp, Transition, ValidationError,
};

/// Resolved inputs of a creation.
#[derive(Debug, Clone, Copy)]
pub struct Proposal<'a> {
    pub requester: &'a Agent,
    pub recipient: &'a Agent,
    pub requester_shift: &'a ShiftRecord,
    pub recipient_shift: &'a ShiftRecord,
}

/// Validate a creation and build the pending request.
///
/// The one-active-request-per-pair rule needs the ledger and is checked by
/// the store at commit time.
pub fn propose(
    proposal: Proposal<'_>,
    message: Option<String>,
    policy: &SwapPolicy,
    now: Timestamp,
) -> RosterResult<SwapRequest> {
    let Proposal {
        requester,
        recipient,
        requester_shift,
        recipient_shift,
    } = proposal;

    if requester.agent_id == recipient.agent_id {
        return Err(ValidationError::SelfSwap.into());
    }
    if policy.require_active_agents {
        for agent in [requester, recipient] {
            if !agent.is_schedulable() {
                return Err(ValidationError::InactiveAgent {
                    agent_id: agent.agent_id,
                }
                .into());
            }
        }
    }
    for (shift, owner) in [
        (requester_shift, requester.agent_id),
        (recipient_shift, recipient.agent_id),
    ] {
        if shift.agent_id != owner {
            return Err(ValidationError::ShiftOwnershipMismatch {
                shift_id: shift.shift_id,
                expected: owner,
                actual: shift.agent_id,
            }
            .into());
        }
    }

    let message = normalize_text("message", message, policy)?;
    Ok(SwapRequest::pending(
        requester.agent_id,
        SwapDraft {
            recipient_id: recipient.agent_id,
            requester_shift_id: requester_shift.shift_id,
            recipient_shift_id: recipient_shift.shift_id,
            message,
        },
        now,
    ))
}

/// Apply a command to a request snapshot.
pub fn apply(
    request: &SwapRequest,
    command: SwapCommand,
    actor: &Agent,
    policy: &SwapPolicy,
    now: Timestamp,
) -> RosterResult<Transition> {
    let action = command.action_name();
    match command {
        SwapCommand::Respond { response, comment } => {
            // Anyone but the recipient must not learn the request exists.
            if actor.agent_id != request.recipient_id {
                return Err(RosterError::not_found(EntityType::SwapRequest, request.swap_id));
            }
            require_status(request, SwapStatus::Pending, action)?;
            let comment = normalize_text("comment", comment, policy)?;

            let (status, audit) = match response {
                AgentResponse::Accept => (SwapStatus::AgentAccepted, AuditAction::AgentAccepted),
                AgentResponse::Refuse => (SwapStatus::AgentRefused, AuditAction::AgentRefused),
            };
            let mut next = advance(request, status, now);
            next.responded_at = Some(now);
            next.recipient_comment = comment.clone();

            Ok(Transition {
                previous: request.status,
                effects: vec![audit_effect(&next, audit, actor, comment, now)],
                next,
            })
        }
        SwapCommand::Decide { decision, comment } => {
            if !actor.role.can_decide_swaps() {
                return Err(RosterError::forbidden(
                    actor.agent_id,
                    "decide on swap requests",
                ));
            }
            require_status(request, SwapStatus::AgentAccepted, action)?;
            let comment = normalize_text("comment", comment, policy)?;

            let (status, audit) = match decision {
                SupervisorDecision::Validate => {
                    (SwapStatus::SupervisorValidated, AuditAction::SupervisorValidated)
                }
                SupervisorDecision::Refuse => {
                    (SwapStatus::SupervisorRefused, AuditAction::SupervisorRefused)
                }
            };
            let mut next = advance(request, status, now);
            next.decided_at = Some(now);
            next.supervisor_id = Some(actor.agent_id);
            next.supervisor_comment = comment.clone();

            let mut effects = Vec::with_capacity(2);
            if audit.exchanged_shifts() {
                effects.push(SwapEffect::ExchangeShifts(ShiftExchange::for_request(request)));
            }
            effects.push(audit_effect(&next, audit, actor, comment, now));

            Ok(Transition {
                previous: request.status,
                next,
                effects,
            })
        }
        SwapCommand::Cancel => {
            if !request.is_visible_to(actor) {
                return Err(RosterError::not_found(EntityType::SwapRequest, request.swap_id));
            }
            if actor.agent_id != request.requester_id && !actor.role.can_cancel_any_swap() {
                return Err(RosterError::forbidden(
                    actor.agent_id,
                    "cancel a swap request they did not create",
                ));
            }
            if request.is_terminal() {
                return Err(invalid_transition(request, action));
            }

            let mut next = advance(request, SwapStatus::Cancelled, now);
            next.cancelled_at = Some(now);

            Ok(Transition {
                previous: request.status,
                effects: vec![audit_effect(&next, AuditAction::Cancelled, actor, None, now)],
                next,
            })
        }
    }
}

/// Same as [`apply`] with the current time.
pub fn apply_now(
    request: &SwapRequest,
    command: SwapCommand,
    actor: &Agent,
    policy: &SwapPolicy,
) -> RosterResult<Transition> {
    apply(request, command, actor, policy, Utc::now())
}

fn require_status(request: &SwapRequest, expected: SwapStatus, action: &str) -> RosterResult<()> {
    if request.status == expected {
        Ok(())
    } else {
        Err(invalid_transition(request, action))
    }
}

fn invalid_transition(request: &SwapRequest, action: &str) -> RosterError {
    RosterError::InvalidTransition {
        swap_id: request.swap_id,
        status: request.status,
        action: action.to_string(),
    }
}

fn advance(request: &SwapRequest, status: SwapStatus, now: Timestamp) -> SwapRequest {
    let mut next = request.clone();
    next.status = status;
    next.updated_at = now;
    next
}

fn audit_effect(
    next: &SwapRequest,
    action: AuditAction,
    actor: &Agent,
    comment: Option<String>,
    now: Timestamp,
) -> SwapEffect {
    SwapEffect::AppendAudit(AuditEntry::new(
        next.swap_id,
        action,
        actor.agent_id,
        comment,
        now,
    ))
}

/// Trim free text; blank becomes `None`. Enforces the policy length limit.
pub fn normalize_text(
    field: &str,
    text: Option<String>,
    policy: &SwapPolicy,
) -> Result<Option<String>, ValidationError> {
    let Some(text) = text else {
        return Ok(None);
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let len = trimmed.chars().count();
    if len > policy.max_message_len {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            reason: format!(
                "{} characters exceeds the limit of {}",
                len, policy.max_message_len
            ),
        });
    }
    Ok(Some(trimmed.to_string()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use roster_core::{Role, ServiceType};

    struct Cast {
        requester: Agent,
        recipient: Agent,
        other: Agent,
        supervisor: Agent,
        admin: Agent,
        requester_shift: ShiftRecord,
        recipient_shift: ShiftRecord,
    }

    fn cast() -> Cast {
        let requester = Agent::new("alice", Role::Agent);
        let recipient = Agent::new("bruno", Role::Agent);
        let date = NaiveDate::from_ymd_opt(2025, 6, 24).expect("valid date");
        Cast {
            requester_shift: ShiftRecord::new(requester.agent_id, date, ServiceType::Morning),
            recipient_shift: ShiftRecord::new(recipient.agent_id, date, ServiceType::Night),
            requester,
            recipient,
            other: Agent::new("chloe", Role::Agent),
            supervisor: Agent::new("sam", Role::Supervisor),
            admin: Agent::new("root", Role::Admin),
        }
    }

    fn message(text: Option<&str>) -> Option<String> {
        text.map(str::to_string)
    }

    fn proposal(cast: &Cast) -> Proposal<'_> {
        Proposal {
            requester: &cast.requester,
            recipient: &cast.recipient,
            requester_shift: &cast.requester_shift,
            recipient_shift: &cast.recipient_shift,
        }
    }

    fn pending(cast: &Cast) -> SwapRequest {
        propose(proposal(cast), None, &SwapPolicy::default(), Utc::now()).unwrap()
    }

    fn respond(response: AgentResponse, comment: Option<&str>) -> SwapCommand {
        SwapCommand::Respond {
            response,
            comment: comment.map(str::to_string),
        }
    }

    fn decide(decision: SupervisorDecision) -> SwapCommand {
        SwapCommand::Decide {
            decision,
            comment: None,
        }
    }

    #[test]
    fn test_propose_builds_pending_request() {
        let cast = cast();
        let request = propose(
            proposal(&cast),
            message(Some("  family event  ")),
            &SwapPolicy::default(),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(request.status, SwapStatus::Pending);
        assert_eq!(request.requester_id, cast.requester.agent_id);
        assert_eq!(request.message.as_deref(), Some("family event"));
        assert!(request.responded_at.is_none());
    }

    #[test]
    fn test_propose_rejects_self_swap() {
        let cast = cast();
        let p = Proposal {
            recipient: &cast.requester,
            ..proposal(&cast)
        };
        let err = propose(p, None, &SwapPolicy::default(), Utc::now()).unwrap_err();
        assert_eq!(err, RosterError::Validation(ValidationError::SelfSwap));
    }

    #[test]
    fn test_propose_rejects_foreign_shift() {
        let cast = cast();
        let p = Proposal {
            requester_shift: &cast.recipient_shift,
            ..proposal(&cast)
        };
        let err = propose(p, None, &SwapPolicy::default(), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            RosterError::Validation(ValidationError::ShiftOwnershipMismatch { .. })
        ));
    }

    #[test]
    fn test_propose_inactive_recipient_depends_on_policy() {
        let cast = cast();
        let inactive = cast.recipient.clone().out_of_rotation();
        let p = Proposal {
            recipient: &inactive,
            ..proposal(&cast)
        };
        let err = propose(p, None, &SwapPolicy::default(), Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            RosterError::Validation(ValidationError::InactiveAgent { .. })
        ));

        let lenient = SwapPolicy {
            require_active_agents: false,
            ..SwapPolicy::default()
        };
        assert!(propose(p, None, &lenient, Utc::now()).is_ok());
    }

    #[test]
    fn test_propose_rejects_oversized_message() {
        let cast = cast();
        let policy = SwapPolicy {
            max_message_len: 5,
            ..SwapPolicy::default()
        };
        let err = propose(proposal(&cast), message(Some("too long")), &policy, Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            RosterError::Validation(ValidationError::InvalidValue { ref field, .. }) if field == "message"
        ));
    }

    #[test]
    fn test_accept_records_response() {
        let cast = cast();
        let request = pending(&cast);
        let now = Utc::now();
        let transition = apply(
            &request,
            respond(AgentResponse::Accept, Some("ok for me")),
            &cast.recipient,
            &SwapPolicy::default(),
            now,
        )
        .unwrap();

        assert_eq!(transition.previous, SwapStatus::Pending);
        assert_eq!(transition.next.status, SwapStatus::AgentAccepted);
        assert_eq!(transition.next.responded_at, Some(now));
        assert_eq!(transition.next.recipient_comment.as_deref(), Some("ok for me"));
        assert!(!transition.exchanges_shifts());
        let audit: Vec<_> = transition.audit_entries().collect();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, AuditAction::AgentAccepted);
        assert_eq!(audit[0].actor_id, cast.recipient.agent_id);
    }

    #[test]
    fn test_blank_comment_is_dropped() {
        let cast = cast();
        let request = pending(&cast);
        let transition = apply_now(
            &request,
            respond(AgentResponse::Refuse, Some("   ")),
            &cast.recipient,
            &SwapPolicy::default(),
        )
        .unwrap();
        assert_eq!(transition.next.status, SwapStatus::AgentRefused);
        assert_eq!(transition.next.recipient_comment, None);
    }

    #[test]
    fn test_respond_by_non_recipient_is_not_found() {
        let cast = cast();
        let request = pending(&cast);
        for actor in [&cast.requester, &cast.other, &cast.supervisor, &cast.admin] {
            let err = apply_now(
                &request,
                respond(AgentResponse::Accept, None),
                actor,
                &SwapPolicy::default(),
            )
            .unwrap_err();
            assert!(matches!(err, RosterError::NotFound { .. }), "{err}");
        }
    }

    #[test]
    fn test_respond_twice_is_invalid_transition() {
        let cast = cast();
        let request = pending(&cast);
        let accepted = apply_now(
            &request,
            respond(AgentResponse::Accept, None),
            &cast.recipient,
            &SwapPolicy::default(),
        )
        .unwrap()
        .next;
        let err = apply_now(
            &accepted,
            respond(AgentResponse::Refuse, None),
            &cast.recipient,
            &SwapPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RosterError::InvalidTransition {
                status: SwapStatus::AgentAccepted,
                ..
            }
        ));
    }

    #[test]
    fn test_decide_requires_supervisor() {
        let cast = cast();
        let mut request = pending(&cast);
        request.status = SwapStatus::AgentAccepted;
        for actor in [&cast.requester, &cast.recipient, &cast.admin] {
            let err = apply_now(
                &request,
                decide(SupervisorDecision::Validate),
                actor,
                &SwapPolicy::default(),
            )
            .unwrap_err();
            assert!(matches!(err, RosterError::Forbidden { .. }), "{err}");
        }
    }

    #[test]
    fn test_forbidden_takes_precedence_over_status() {
        let cast = cast();
        let request = pending(&cast);
        let err = apply_now(
            &request,
            decide(SupervisorDecision::Refuse),
            &cast.recipient,
            &SwapPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RosterError::Forbidden { .. }));
    }

    #[test]
    fn test_validate_emits_exchange_and_audit() {
        let cast = cast();
        let mut request = pending(&cast);
        request.status = SwapStatus::AgentAccepted;
        let now = Utc::now();
        let transition = apply(
            &request,
            SwapCommand::Decide {
                decision: SupervisorDecision::Validate,
                comment: Some("approved".to_string()),
            },
            &cast.supervisor,
            &SwapPolicy::default(),
            now,
        )
        .unwrap();

        assert_eq!(transition.next.status, SwapStatus::SupervisorValidated);
        assert_eq!(transition.next.supervisor_id, Some(cast.supervisor.agent_id));
        assert_eq!(transition.next.decided_at, Some(now));
        assert_eq!(transition.next.supervisor_comment.as_deref(), Some("approved"));
        assert_eq!(
            transition.effects[0],
            SwapEffect::ExchangeShifts(ShiftExchange {
                requester_shift_id: cast.requester_shift.shift_id,
                requester_id: cast.requester.agent_id,
                recipient_shift_id: cast.recipient_shift.shift_id,
                recipient_id: cast.recipient.agent_id,
            })
        );
        assert_eq!(transition.audit_entries().count(), 1);
    }

    #[test]
    fn test_supervisor_refusal_has_no_exchange() {
        let cast = cast();
        let mut request = pending(&cast);
        request.status = SwapStatus::AgentAccepted;
        let transition = apply_now(
            &request,
            decide(SupervisorDecision::Refuse),
            &cast.supervisor,
            &SwapPolicy::default(),
        )
        .unwrap();
        assert_eq!(transition.next.status, SwapStatus::SupervisorRefused);
        assert!(!transition.exchanges_shifts());
        let audit: Vec<_> = transition.audit_entries().collect();
        assert_eq!(audit[0].action, AuditAction::SupervisorRefused);
    }

    #[test]
    fn test_cancel_rules() {
        let cast = cast();
        let request = pending(&cast);
        let policy = SwapPolicy::default();

        let err = apply_now(&request, SwapCommand::Cancel, &cast.other, &policy).unwrap_err();
        assert!(matches!(err, RosterError::NotFound { .. }));

        let err = apply_now(&request, SwapCommand::Cancel, &cast.recipient, &policy).unwrap_err();
        assert!(matches!(err, RosterError::Forbidden { .. }));

        let err = apply_now(&request, SwapCommand::Cancel, &cast.supervisor, &policy).unwrap_err();
        assert!(matches!(err, RosterError::Forbidden { .. }));

        let by_admin = apply_now(&request, SwapCommand::Cancel, &cast.admin, &policy).unwrap();
        assert_eq!(by_admin.next.status, SwapStatus::Cancelled);

        let by_requester = apply_now(&request, SwapCommand::Cancel, &cast.requester, &policy).unwrap();
        assert_eq!(by_requester.next.status, SwapStatus::Cancelled);
        assert!(by_requester.next.cancelled_at.is_some());

        let err = apply_now(&by_requester.next, SwapCommand::Cancel, &cast.requester, &policy)
            .unwrap_err();
        assert!(matches!(err, RosterError::InvalidTransition { .. }));
    }

    #[test]
    fn test_accepted_request_can_still_be_cancelled() {
        let cast = cast();
        let mut request = pending(&cast);
        request.status = SwapStatus::AgentAccepted;
        let transition =
            apply_now(&request, SwapCommand::Cancel, &cast.requester, &SwapPolicy::default())
                .unwrap();
        assert_eq!(transition.previous, SwapStatus::AgentAccepted);
        assert_eq!(transition.next.status, SwapStatus::Cancelled);
    }
}
